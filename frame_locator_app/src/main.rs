#![allow(clippy::let_and_return)]
#![warn(clippy::cast_lossless)]
#![allow(clippy::doc_markdown)]

#[macro_use]
extern crate log;

mod app;

fn main() {
    let return_code = app::run_app();
    std::process::exit(return_code)
}
