// Use jemalloc for better memory allocation performance on Unix-like systems
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

// Use mimalloc on Windows for better performance
#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{CommandFactory, Parser};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use txt2html_lib::Converter;
use txt2html_lib::cli::{Cli, Command, ConvertArgs, DictAction};
use txt2html_lib::config::Config;
use txt2html_lib::dict::LinkDictionary;
use txt2html_lib::exit_codes::exit;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Convert(cli.convert));

    let result = match command {
        Command::Convert(args) => run_convert(&args),
        Command::Dict { action } => run_dict(action),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    };

    if let Err(message) = result {
        eprintln!("{}: {}", "error".red().bold(), message);
        exit::tool_error();
    }
    exit::success();
}

fn load_config(args: &ConvertArgs) -> Result<Config, String> {
    let mut cfg = match &args.config {
        Some(path) => Config::load_from_file(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    args.apply_to(&mut cfg);
    cfg.normalize();
    Ok(cfg)
}

fn run_convert(args: &ConvertArgs) -> Result<(), String> {
    let cfg = load_config(args)?;
    let mut converter = Converter::new(cfg.clone());
    converter.load_dictionaries().map_err(|e| e.to_string())?;

    if cfg.extract {
        let input_text = read_inputs(&args.inputs)?;
        let fragment = converter.convert_fragment(&input_text, true).0;
        write_output(&args.output, &fragment)
    } else if args.inputs.is_empty() {
        let input_text = read_inputs(&args.inputs)?;
        let html = converter.convert_document_str(&input_text).map_err(|e| e.to_string())?;
        write_output(&args.output, &html)
    } else {
        let input_paths: Vec<&Path> = args.inputs.iter().map(|p| p.as_path()).collect();
        let mut buf: Vec<u8> = Vec::new();
        converter
            .convert_document(&input_paths, &mut buf)
            .map_err(|e| e.to_string())?;
        write_output(&args.output, &String::from_utf8_lossy(&buf))
    }
}

fn read_inputs(inputs: &[std::path::PathBuf]) -> Result<String, String> {
    if inputs.is_empty() {
        let mut text = String::new();
        io::Read::read_to_string(&mut io::stdin(), &mut text).map_err(|e| e.to_string())?;
        Ok(text)
    } else {
        let mut combined = String::new();
        for (i, path) in inputs.iter().enumerate() {
            let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            if i > 0 {
                combined.push('\n');
            }
            combined.push_str(&text);
        }
        Ok(combined)
    }
}

fn write_output(output: &Option<std::path::PathBuf>, text: &str) -> Result<(), String> {
    match output {
        Some(path) => fs::write(path, text).map_err(|e| format!("cannot write {}: {e}", path.display())),
        None => io::stdout().write_all(text.as_bytes()).map_err(|e| e.to_string()),
    }
}

fn run_dict(action: DictAction) -> Result<(), String> {
    match action {
        DictAction::Check { path } => {
            let source = fs::read_to_string(&path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            let dict = LinkDictionary::compile(&source, &path, false, 0).map_err(|e| e.to_string())?;
            println!(
                "{} {} rule(s) compiled cleanly from {}",
                "ok:".green().bold(),
                dict.rules.len(),
                path.display()
            );
            Ok(())
        }
        DictAction::Compile { path } => {
            let source = fs::read_to_string(&path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            let dict = LinkDictionary::compile(&source, &path, false, 0).map_err(|e| e.to_string())?;
            for (i, rule) in dict.rules.iter().enumerate() {
                println!("{:>3}: {:<30} [{:?}]", i + 1, rule.pattern, rule.switches);
            }
            Ok(())
        }
    }
}
