use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const RUN_CMD: &str = "run";

pub fn create_run_cli() -> Command {
    Command::new(RUN_CMD)
        .about("Test every element for excess mutation recurrence against randomized mutation sets.")
        .arg(
            Arg::new("muts")
                .short('m')
                .long("muts")
                .value_name("FILE")
                .help("Mutations table (CHROMOSOME POSITION REF ALT [SAMPLE] [ELEMENT])")
                .required(true),
        )
        .arg(
            Arg::new("elements")
                .short('e')
                .long("elements")
                .value_name("FILE")
                .help("Elements table (CHROMOSOME START END ELEMENT [SYMBOL])")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Results table; gzip compressed when it ends in .gz")
                .required(true),
        )
        .arg(
            Arg::new("regions")
                .short('r')
                .long("regions")
                .value_name("FILE")
                .help("Regions of interest, used by the `regions` score"),
        )
        .arg(
            Arg::new("regions-output")
                .long("regions-output")
                .value_name("FILE")
                .help("G-test table of the regions of interest; gzip compressed when it ends in .gz")
                .requires("regions"),
        )
        .arg(
            Arg::new("signature")
                .short('s')
                .long("signature")
                .value_name("FILE")
                .help("Mutational signature as JSON ({\"ACA>T\": p, ...})"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file; the options below override it"),
        )
        .arg(arg!(-g --genome <ID> "Reference genome identifier"))
        .arg(arg!(--"genomes-dir" <DIR> "Directory holding <genome>.fa[.gz]"))
        .arg(
            arg!(-n --cores <NUMBER> "Worker threads (default: all cores)")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(--seed <SEED> "Seed for reproducible runs").value_parser(value_parser!(u64)))
        .arg(
            arg!(--sampling <NUMBER> "Randomized mutation sets per element")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"sampling-chunk" <NUMBER> "Randomized sets per chunk task")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"muts-min" <NUMBER> "Elements with fewer mutations are not tested")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(--score <SCORE> "hotspot, recurrence or regions"))
        .arg(
            Arg::new("no-progress")
                .long("no-progress")
                .help("Hide the progress bar")
                .action(ArgAction::SetTrue),
        )
}
