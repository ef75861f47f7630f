//! pear - transparent compiler and linker wrapper
//!
//! Install by symlinking a toolchain name (gcc, g++, ld, ...) to this binary
//! and describing the real tool in `pear.conf`. The wrapper reports the real
//! tool's exit status as its own; wrapper failures exit with 1.

use pear_shim::{diagnostics, run_shim};

fn main() {
    diagnostics::init();
    let code = match run_shim() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("pear: {err:#}");
            1
        }
    };
    std::process::exit(code);
}
