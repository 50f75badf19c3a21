//! Version command

use console::style;

pub fn run() {
    println!(
        "{} {}",
        style(env!("CARGO_BIN_NAME")).bold(),
        env!("CARGO_PKG_VERSION")
    );
}
