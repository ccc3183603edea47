use cv_matching::{Matcher, Strategy};
use log::*;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "descmatch",
    about = "A tool to match two sets of feature descriptors"
)]
struct Opt {
    /// The matching strategy: nn, snn, mnn, or smnn.
    #[structopt(short, long, default_value = "mnn")]
    strategy: Strategy,
    /// The first to second nearest neighbor ratio threshold, in (0, 1].
    ///
    /// Only used by snn and smnn.
    #[structopt(short, long, default_value = "0.8")]
    threshold: f32,
    /// The output path to write matches to as `idx_a,idx_b,score` lines.
    ///
    /// If this is not provided, then the output goes to stdout.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// Descriptors of set A, one per line.
    #[structopt(parse(from_os_str))]
    a: PathBuf,
    /// Descriptors of set B, one per line.
    #[structopt(parse(from_os_str))]
    b: PathBuf,
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    let a = descmatch::read_descriptors(&opt.a).expect("failed to read descriptors of set A");
    let b = descmatch::read_descriptors(&opt.b).expect("failed to read descriptors of set B");
    info!("Loaded {} and {} descriptors", a.nrows(), b.nrows());
    let matches = Matcher::new(opt.threshold)
        .run(opt.strategy, &a, &b)
        .expect("failed to match descriptors");
    if let Some(path) = opt.output {
        let file = std::fs::File::create(path).expect("failed to create output file");
        descmatch::write_matches(std::io::BufWriter::new(file), &matches)
            .expect("failed to write matches");
    } else {
        let stdout = std::io::stdout();
        descmatch::write_matches(stdout.lock(), &matches)
            .expect("failed to write matches to stdout");
    }
}
