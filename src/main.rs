use anyhow::Result;
use clap::Parser;
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rusnmp::{ObjectSyntax, SetNumber, SetValue, Snmp, SnmpV2TrapServer, SnmpVarbind};

#[derive(Parser, Debug)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Get {
        #[clap(short, long, required = true)]
        community: String,
        #[clap(short, long, required = true)]
        oid: String,
        #[clap(required = true, num_args = 1..)]
        targets: Vec<String>,
    },
    Walk {
        #[clap(short, long, required = true)]
        community: String,
        #[clap(short, long, required = true)]
        oid: String,
        #[clap(required = true, num_args = 1..)]
        targets: Vec<String>,
    },
    Bulk {
        #[clap(short, long, required = true)]
        community: String,

        #[clap(short, long, required = true)]
        target: String,

        #[clap(short, long, default_value_t = 0)]
        non_repeaters: i32,

        #[clap(short, long, default_value_t = 10)]
        max_repetitions: i32,

        #[clap(required = true, num_args = 1..)]
        oids: Vec<String>,
    },
    BulkWalk {
        #[clap(short, long, required = true)]
        community: String,

        #[clap(short, long, required = true)]
        target: String,

        #[clap(short, long, default_value_t = 20)]
        max_repetitions: i32,

        #[clap(required = true)]
        oid: String,
    },
    Set {
        #[clap(short, long, required = true)]
        community: String,

        #[clap(short, long, required = true)]
        target: String,

        /// OID=value pairs, e.g. `.1.3.6.1.2.1.1.4.0=admin@example.com`.
        /// Append `#Number` (Counter32/Gauge32/TimeTicks/Counter64/
        /// Uinteger32) to target one of those types explicitly, e.g.
        /// `.1.3.6.1.4.1.8072.2.255.6.0=42#Counter32`.
        #[clap(required = true, num_args = 1..)]
        varbinds: Vec<String>,
    },
    Trap {
        #[clap(long, default_value = "0.0.0.0")]
        host: String,

        #[clap(long, default_value_t = 162)]
        port: u16,

        #[clap(long)]
        community: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let multi_progress = MultiProgress::new();
    let main_pb = multi_progress.add(ProgressBar::new(0));
    main_pb.set_style(ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
    )?);

    match cli.command {
        Command::Get {
            targets,
            community,
            oid,
        } => {
            println!("Starting GET for {} targets", targets.len());

            let futures = targets.iter().map(|target| {
                let snmp = Snmp::new(target.as_str()).with_community(community.clone());
                let oid = oid.clone();
                async move { snmp.get(&[&oid]).await }
            });

            let results = join_all(futures).await;

            for (target, result) in targets.iter().zip(results) {
                println!("\n--- Result for {target} ---");
                match result {
                    Ok(varbinds) => varbinds.iter().for_each(print_varbind),
                    Err(e) => println!("Error: {e}"),
                }
            }
        }
        Command::Walk {
            targets,
            community,
            oid,
        } => {
            let futures = targets.iter().map(|target| {
                let snmp = Snmp::new(target.as_str()).with_community(community.clone());
                let oid = oid.clone();
                async move { snmp.walk(&oid).await }
            });

            let results = join_all(futures).await;

            for (target, result) in targets.iter().zip(results) {
                println!("\n--- Result for {target} ---");
                match result {
                    Ok(varbinds) => {
                        println!("Success! (Found {} results)", varbinds.len());
                        varbinds.iter().for_each(print_varbind);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
        }
        Command::Bulk {
            community,
            non_repeaters,
            max_repetitions,
            target,
            oids,
        } => {
            println!(
                "--- starting getbulk for {target} (NR: {non_repeaters}, MR: {max_repetitions}) ---"
            );

            let oid_strs: Vec<&str> = oids.iter().map(AsRef::as_ref).collect();
            let snmp = Snmp::new(target.as_str()).with_community(community);
            let varbinds = snmp
                .get_bulk(&oid_strs, Some(non_repeaters), Some(max_repetitions))
                .await?;

            println!("Success, found {} results", varbinds.len());
            varbinds.iter().for_each(print_varbind);
        }
        Command::BulkWalk {
            community,
            target,
            max_repetitions,
            oid,
        } => {
            println!("--- Starting BULK WALK for {target} (MR: {max_repetitions}) ---");

            let snmp = Snmp::new(target.as_str()).with_community(community);
            let varbinds = snmp.bulk_walk(&oid, None, Some(max_repetitions)).await?;

            println!("\n--- Success (Found {} results) ---", varbinds.len());
            varbinds.iter().for_each(print_varbind);
        }
        Command::Set {
            community,
            target,
            varbinds,
        } => {
            let pairs = varbinds
                .iter()
                .map(|entry| parse_set_varbind(entry))
                .collect::<Result<Vec<_>>>()?;

            let snmp = Snmp::new(target.as_str()).with_community(community);
            let results = snmp.set(pairs).await?;

            println!("--- Success (Set {} varbinds) ---", results.len());
            results.iter().for_each(print_varbind);
        }
        Command::Trap {
            host,
            port,
            community,
        } => {
            println!("--- Listening for SNMPv2 traps on {host}:{port} ---");
            let mut server = SnmpV2TrapServer::new().with_host(host).with_port(port);
            if !community.is_empty() {
                server = server.with_communities(community);
            }
            server.run().await?;
        }
    }
    Ok(())
}

/// Parses a `<oid>=<value>` or `<oid>=<value>#<number>` CLI argument into an
/// `(oid, SetValue, Option<SetNumber>)` triple. The value is treated as an
/// `int` if it parses as one, otherwise as text.
fn parse_set_varbind(entry: &str) -> Result<(String, SetValue, Option<SetNumber>)> {
    let (oid, rest) = entry
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected OID=VALUE, got '{entry}'"))?;
    let (value, number) = match rest.split_once('#') {
        Some((value, number)) => (value, Some(parse_set_number(number)?)),
        None => (rest, None),
    };
    let value = match value.parse::<i64>() {
        Ok(i) => SetValue::Int(i),
        Err(_) => SetValue::Text(value.to_string()),
    };
    Ok((oid.to_string(), value, number))
}

fn parse_set_number(name: &str) -> Result<SetNumber> {
    match name {
        "Counter32" => Ok(SetNumber::Counter32),
        "Gauge32" => Ok(SetNumber::Gauge32),
        "TimeTicks" => Ok(SetNumber::TimeTicks),
        "Counter64" => Ok(SetNumber::Counter64),
        "Uinteger32" => Ok(SetNumber::Uinteger32),
        other => Err(anyhow::anyhow!(
            "unknown number '{other}', expected one of Counter32/Gauge32/TimeTicks/Counter64/Uinteger32"
        )),
    }
}

fn print_varbind(varbind: &SnmpVarbind) {
    print!("OID: {} | Value: ", varbind.oid);
    match &varbind.value {
        ObjectSyntax::Text(val) => println!("{val}"),
        ObjectSyntax::Bytes(val) => println!("{}", String::from_utf8_lossy(val)),
        ObjectSyntax::Integer(val) => println!("{val:?}"),
        ObjectSyntax::Counter32(val) => println!("{val}"),
        ObjectSyntax::Gauge32(val) => println!("{val}"),
        ObjectSyntax::TimeTicks(val) => println!("{val}"),
        ObjectSyntax::Counter64(val) => println!("{val}"),
        ObjectSyntax::Uinteger32(val) => println!("{val}"),
        ObjectSyntax::Ipv4(val) => println!("{val}"),
        other => println!("{other:?}"),
    }
}
