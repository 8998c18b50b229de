use KinEq::Examples::equilibrium_examples::equilibrium_examples;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

pub fn main() {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    //
    let task: usize = 2;
    equilibrium_examples(task);
}
