use clap::{Args, Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use noderange::{NodeSet, ParseOptions, RangeSet, SetAlgebra};
use std::io::BufRead;

#[derive(Parser)]
#[command(author, version, about = "Compute with compact cluster node sets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fold the sets into their most compact form
    Fold(SetArgs),
    /// Expand the sets into individual names
    Expand(ExpandArgs),
    /// Count the members of the sets
    Count(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    /// Sets to union, read from stdin when absent or `-`
    sets: Vec<String>,

    /// Fold runs of at least N stepped ids as lo-hi/step
    #[arg(short, long, value_name = "N")]
    autostep: Option<usize>,

    /// Operate on bare numeric ranges instead of node names
    #[arg(short = 'R', long)]
    rangeset: bool,

    /// Do not print the offending fragment of a parse error
    #[arg(short, long)]
    quiet: bool,

    /// Keep only members also present in SET
    #[arg(short, long, value_name = "SET")]
    intersection: Vec<String>,

    /// Remove the members of SET
    #[arg(short = 'x', long, value_name = "SET")]
    exclude: Vec<String>,

    /// Keep members present in exactly one operand
    #[arg(short = 'X', long, value_name = "SET")]
    xor: Vec<String>,
}

#[derive(Args)]
struct ExpandArgs {
    #[command(flatten)]
    set: SetArgs,

    /// Separator between expanded names (\n, \t, \r, \0, \\ honored)
    #[arg(short = 'S', long, default_value = " ")]
    separator: String,
}

enum Output {
    Fold,
    Count,
    Expand(String),
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Fold(args) => dispatch(&args, &Output::Fold),
        Command::Count(args) => dispatch(&args, &Output::Count),
        Command::Expand(args) => {
            let sep = unescape_separator(&args.separator)?;
            dispatch(&args.set, &Output::Expand(sep))
        }
    }
}

fn dispatch(args: &SetArgs, out: &Output) -> Result<()> {
    if args.rangeset {
        run_command::<RangeSet>(args, out)
    } else {
        run_command::<NodeSet>(args, out)
    }
}

fn run_command<T: SetAlgebra>(args: &SetArgs, out: &Output) -> Result<()> {
    let inputs = gather_inputs(args)?;
    let set = match build_set::<T>(args, &inputs) {
        Ok(set) => set,
        Err(e) => report_parse_error(&e, args.quiet),
    };

    match out {
        Output::Fold => println!("{}", set.fold()),
        Output::Count => println!("{}", set.count()),
        Output::Expand(sep) => println!("{}", set.expand().collect::<Vec<_>>().join(sep)),
    }
    Ok(())
}

/// Positional sets, with stdin spliced in when requested. Lines from
/// stdin may hold several whitespace-separated sets and `#` comments.
fn gather_inputs(args: &SetArgs) -> Result<Vec<String>> {
    let mut inputs: Vec<String> = args.sets.iter().filter(|s| *s != "-").cloned().collect();

    if args.sets.is_empty() || args.sets.iter().any(|s| s == "-") {
        for line in std::io::stdin().lock().lines() {
            let line = line.wrap_err("reading sets from stdin")?;
            let line = line.split('#').next().unwrap_or("");
            inputs.extend(line.split_whitespace().map(str::to_owned));
        }
    }

    Ok(inputs)
}

/// Unions the inputs, then applies the refinements in option order:
/// intersections, exclusions, xors.
fn build_set<T: SetAlgebra>(args: &SetArgs, inputs: &[String]) -> Result<T, noderange::Error> {
    let mut opts = ParseOptions::default();
    if let Some(n) = args.autostep {
        opts = opts.autostep(n);
    }

    let mut set = T::parse_with("", &opts)?;
    for input in inputs {
        set.update(&T::parse_with(input, &opts)?);
    }
    for other in &args.intersection {
        set.intersection_update(&T::parse_with(other, &opts)?);
    }
    for other in &args.exclude {
        set.difference_update(&T::parse_with(other, &opts)?);
    }
    for other in &args.xor {
        set.symmetric_difference_update(&T::parse_with(other, &opts)?);
    }

    Ok(set)
}

fn report_parse_error(e: &noderange::Error, quiet: bool) -> ! {
    eprintln!("parse error: {e}");
    if !quiet {
        if let Some(fragment) = e.fragment() {
            eprintln!(">> {fragment}");
        }
    }
    std::process::exit(1);
}

fn unescape_separator(sep: &str) -> Result<String> {
    let mut out = String::with_capacity(sep.len());
    let mut chars = sep.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            _ => return Err(eyre!("invalid escape in separator '{sep}'")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(sets: &[&str]) -> SetArgs {
        SetArgs {
            sets: sets.iter().map(|s| s.to_string()).collect(),
            autostep: None,
            rangeset: false,
            quiet: false,
            intersection: vec![],
            exclude: vec![],
            xor: vec![],
        }
    }

    #[test]
    fn test_build_set_union_then_refine() {
        let mut a = args(&[]);
        a.exclude = vec!["node3".to_string()];
        let inputs = vec!["node[1-4]".to_string(), "node[8-9]".to_string()];
        let set: NodeSet = build_set(&a, &inputs).unwrap();
        assert_eq!(set.fold(), "node[1-2,4,8-9]");
    }

    #[test]
    fn test_build_set_rangeset() {
        let mut a = args(&[]);
        a.autostep = Some(3);
        let inputs = vec!["2,4".to_string(), "6".to_string()];
        let set: RangeSet = build_set(&a, &inputs).unwrap();
        assert_eq!(set.fold(), "2-6/2");
    }

    #[test]
    fn test_unescape_separator() {
        assert_eq!(unescape_separator(" ").unwrap(), " ");
        assert_eq!(unescape_separator("\\n").unwrap(), "\n");
        assert_eq!(unescape_separator("a\\tb").unwrap(), "a\tb");
        assert!(unescape_separator("\\z").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "nr", "expand", "-S", ",", "-a", "4", "-x", "node3", "node[1-9]",
        ])
        .unwrap();
        match cli.command {
            Command::Expand(e) => {
                assert_eq!(e.separator, ",");
                assert_eq!(e.set.autostep, Some(4));
                assert_eq!(e.set.exclude, vec!["node3"]);
                assert_eq!(e.set.sets, vec!["node[1-9]"]);
            }
            _ => panic!("expected expand"),
        }
    }
}
