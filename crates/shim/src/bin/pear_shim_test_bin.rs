fn main() {
    pear_shim::diagnostics::init();
    let code = match pear_shim::run_shim() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("pear: {err:#}");
            1
        }
    };
    std::process::exit(code);
}
