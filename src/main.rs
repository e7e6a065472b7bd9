fn main() {
    if let Err(err) = csv_survey::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
