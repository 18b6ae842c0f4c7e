fn main() {
    env_logger::init();

    // A single optional positional argument selects the ROM variant.
    let variant = std::env::args().nth(1);
    if let Err(e) = triton::run(variant.as_deref()) {
        eprintln!("triton: {e:#}");
        std::process::exit(1);
    }
}
