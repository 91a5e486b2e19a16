//! yumc compilation driver: wires the lexer, parser, MIR lowering, omitter
//! and archive I/O into the `compile(source, input, output, idTable?)`
//! pipeline, threading a `Reporter`/`Logger` pair through every stage.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process;

use crate::archive::{Archive, ArchiveError};
use crate::config::{Config, LoadConfigError};
use crate::lexer::Lexer;
use crate::logger::Logger;
use crate::mir;
use crate::omitter::{OmitError, Omitter};
use crate::parser::{self, Parser};
use crate::span::report::{Level, Reporter, Sink, TermSink};
use crate::span::SourceFile;

pub const DEFAULT_CONFIG_FILE: &str = ".yumc.yml";
pub const DEFAULT_LOG_FILE: &str = "yumc.log";

/// Command line arguments for the driver.
pub struct DriverArgs {
    pub source_path: PathBuf,
    pub input_archive_path: PathBuf,
    pub output_archive_path: PathBuf,
    pub id_table_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub target: Option<String>,
}

impl DriverArgs {
    pub fn new<P: Into<PathBuf>>(source_path: P, input_archive_path: P, output_archive_path: P) -> Self {
        DriverArgs {
            source_path: source_path.into(),
            input_archive_path: input_archive_path.into(),
            output_archive_path: output_archive_path.into(),
            id_table_path: None,
            config_path: None,
            target: None,
        }
    }

    pub fn with_id_table_path(self, id_table_path: Option<&str>) -> Self {
        Self {
            id_table_path: id_table_path.map(PathBuf::from),
            ..self
        }
    }

    pub fn with_config_path(self, config_path: Option<&str>) -> Self {
        Self {
            config_path: config_path.map(PathBuf::from),
            ..self
        }
    }

    pub fn with_target(self, target: Option<&str>) -> Self {
        Self {
            target: target.map(str::to_string),
            ..self
        }
    }

    fn id_table_path(&self) -> PathBuf {
        self.id_table_path
            .clone()
            .unwrap_or_else(|| self.output_archive_path.with_extension("idtable.json"))
    }
}

#[derive(Debug)]
pub enum CompileError {
    Config(LoadConfigError),
    MissingTarget,
    Archive(ArchiveError),
    Omit(OmitError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Config(error) => write!(f, "{}", error),
            CompileError::MissingTarget => {
                write!(f, "no target specified: pass --target or set it in the config")
            }
            CompileError::Archive(error) => write!(f, "{}", error),
            CompileError::Omit(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for CompileError {}

/// The compilation driver.
pub struct Driver;

impl Driver {
    /// Runs the full pipeline. Prints diagnostics to the terminal and exits
    /// the process with a non-zero code iff a fatal error was reported.
    pub fn run(args: &DriverArgs) {
        let mut sink = TermSink::new();
        let mut reporter = Reporter::new();

        if let Err(error) = Self::compile(args, &mut reporter, &mut sink) {
            reporter.report_no_span(&mut sink, Level::Error, &format!("{}", error));
        }

        if reporter.count(Level::Error) > 0 {
            sink.writeln(&reporter.summary());
            process::exit(1);
        }
    }

    fn compile(
        args: &DriverArgs,
        reporter: &mut Reporter,
        sink: &mut dyn Sink,
    ) -> Result<(), CompileError> {
        let config = Self::load_config(args)?;
        let target = args
            .target
            .clone()
            .or_else(|| config.target.clone())
            .ok_or(CompileError::MissingTarget)?;

        let log_path = args
            .output_archive_path
            .parent()
            .map(|dir| dir.join(DEFAULT_LOG_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let mut logger = Logger::new(&log_path);
        logger.info("config loaded");

        let lex_handle = logger.perf("lex+parse");
        let source = fs::read_to_string(&args.source_path).map_err(ArchiveError::Io).map_err(CompileError::Archive)?;
        let file = SourceFile::new(args.source_path.to_string_lossy().to_string(), source);
        let program = Self::parse(&file, reporter, sink);
        lex_handle.stop();

        let program = match program {
            Some(program) => program,
            None => return Ok(()),
        };

        let lower_handle = logger.perf("lower to mir");
        let mir_program = Self::lower(&program, config.warp);
        lower_handle.stop();

        let archive_handle = logger.perf("load archive");
        let mut archive = Archive::load(&args.input_archive_path, Some(&args.id_table_path()))
            .map_err(CompileError::Archive)?;
        archive_handle.stop();

        let omit_handle = logger.perf("omit");
        let mut omitter = Omitter::new(&mut archive, &mir_program).with_max_stack_size(config.max_stack_size);
        omitter.set_target(&target);
        omitter.omit().map_err(CompileError::Omit)?;
        omit_handle.stop();

        let export_handle = logger.perf("export archive");
        archive
            .export(&args.output_archive_path, &args.id_table_path())
            .map_err(CompileError::Archive)?;
        export_handle.stop();

        Ok(())
    }

    fn load_config(args: &DriverArgs) -> Result<Config, CompileError> {
        let config_path = args.config_path.clone().or_else(|| {
            let candidate = args.source_path.parent()?.join(DEFAULT_CONFIG_FILE);
            candidate.is_file().then_some(candidate)
        });

        match config_path {
            Some(path) => Config::load_from_file(&path).map_err(CompileError::Config),
            None => Ok(Config::default_config()),
        }
    }

    fn parse<'a>(file: &'a SourceFile, reporter: &mut Reporter, sink: &mut dyn Sink) -> Option<parser::Program<'a>> {
        let lexer = Lexer::new(file);
        let mut parser = Parser::new(lexer);
        parser.parse_program(reporter, sink)
    }

    /// Lowers the parsed declarations to MIR. Since the grammar produces
    /// only empty bodies (no statement syntax is specified yet), every
    /// function lowers to a zero-argument, zero-slot procedure.
    fn lower<'a>(program: &parser::Program<'a>, warp: bool) -> mir::Program<'a> {
        let mut mir_program = mir::Program::new();
        for declaration in &program.declarations {
            match declaration {
                parser::Declaration::Function(function) => {
                    let name = function.name.span.string().to_string();
                    mir_program.declare_function(mir::FunctionDeclaration {
                        name: name.clone(),
                        arguments: Vec::new(),
                        return_type_view: mir::TypeView {
                            typ: mir::Type::Untyped,
                            slots: Vec::new(),
                            offset: 0,
                        },
                        body: mir::Block {
                            statements: Vec::new(),
                            span: function.body.span,
                        },
                        proc_code: name,
                        argument_ids: "[]".to_string(),
                        warp,
                        stack_size: 0,
                        span: function.span,
                    });
                }
            }
        }
        mir_program
    }
}
