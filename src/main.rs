fn main() {
    if let Err(err) = pubsub_graph::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
