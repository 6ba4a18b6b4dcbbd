mod config;

use config::Config;
use dice_roll::{evaluate, parse_notation, rng, DiceLimits};
use getopts::{Matches, Options};
use std::{env, path::Path, process, str::FromStr};

fn print_help(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] EXPRESSION...", program);
    print!("{}", opts.usage(&brief));
}

fn opt_value<T: FromStr>(matches: &Matches, name: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match matches.opt_get::<T>(name) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("invalid value for --{}: {}", name, e);
            process::exit(2);
        }
    }
}

fn main() {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("roll-cmd", String::as_str);
    let mut opts = Options::new();
    opts.optopt("c", "config", "read limits from a TOML file", "FILE");
    opts.optopt("s", "seed", "seed the random source", "SEED");
    opts.optopt("n", "max-rolls", "maximum number of rolls per expression", "N");
    opts.optflag("j", "json", "print each result as JSON");
    opts.optflag("l", "limits", "print the range of each dice notation instead of rolling");
    opts.optflag("h", "help", "print this help");
    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(m) => m,
        Err(fail) => {
            eprintln!("{}", fail);
            print_help(program, &opts);
            process::exit(2);
        }
    };
    if matches.opt_present("h") || matches.free.is_empty() {
        print_help(program, &opts);
        return;
    }

    let mut config = matches
        .opt_str("c")
        .or_else(|| env::var("ROLL_CONFIG").ok())
        .map(|path| Config::load(Path::new(&path)))
        .unwrap_or_default();
    if let Some(seed) = opt_value(&matches, "seed") {
        config.seed = Some(seed);
    }
    if let Some(max_rolls) = opt_value(&matches, "max-rolls") {
        config.max_rolls = Some(max_rolls);
    }
    log::debug!("using {:?}", &config);

    if let Some(seed) = config.seed {
        rng::install(Box::new(rng::ChaChaSource::new(seed)));
    }

    let json = matches.opt_present("j");
    let mut failed = false;
    for expression in &matches.free {
        if matches.opt_present("l") {
            match parse_notation(expression) {
                Ok(props) => println!("{} => [{}, {}]", props, props.min(), props.max()),
                Err(e) => {
                    eprintln!("{}: {}", expression, e);
                    failed = true;
                }
            }
            continue;
        }
        let ctx = config.context();
        match evaluate(&ctx, expression) {
            Ok(result) if json => match serde_json::to_string(&result) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    log::error!("unable to serialize result: {}", e);
                    failed = true;
                }
            },
            Ok(result) => println!(
                "{} => {} = {}",
                result.original, result.rolled, result.result
            ),
            Err(e) => {
                eprintln!("{}: {}", expression, e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}
