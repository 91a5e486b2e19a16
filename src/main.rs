pub mod arena;
pub mod archive;
pub mod config;
mod driver;
pub mod lexer;
pub mod logger;
pub mod mir;
pub mod omitter;
pub mod parser;
pub mod span;
pub mod target_ir;

use clap::{App, Arg};

use driver::{Driver, DriverArgs};

fn main() {
    let matches = App::new("yumc")
        .version("0.1")
        .author("Petr Nevyhoštěný")
        .about("Compiles a small statically-typed language into a block-graph project")
        .arg(
            Arg::with_name("source")
                .value_name("SOURCE")
                .help("Path to the source file")
                .required(true),
        )
        .arg(
            Arg::with_name("input")
                .value_name("INPUT")
                .help("Path to the input project archive (.sb3) new blocks are added to")
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .value_name("OUTPUT")
                .help("Path the compiled project archive is written to")
                .required(true),
        )
        .arg(
            Arg::with_name("id-table")
                .long("id-table")
                .value_name("FILE")
                .help("Path to the identity table stabilising UUIDs across recompiles")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path to the configuration file (defaults to .yumc.yml next to the source file)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("target")
                .short("t")
                .long("target")
                .value_name("NAME")
                .help("Name of the sprite or stage new blocks are added to")
                .takes_value(true),
        )
        .get_matches();

    let args = DriverArgs::new(
        matches.value_of("source").unwrap(),
        matches.value_of("input").unwrap(),
        matches.value_of("output").unwrap(),
    )
    .with_id_table_path(matches.value_of("id-table"))
    .with_config_path(matches.value_of("config"))
    .with_target(matches.value_of("target"));

    Driver::run(&args);
}
