// src/main.rs

//! Runs the application in-process, without reloading.

fn main() {
    if let Err(err) = hotserve::logging::init_logging(None) {
        eprintln!("hello-app: cannot set up logging: {err:?}");
    }
    if let Err(err) = hello_app::serve(8080) {
        eprintln!("hello-app error: {err:?}");
        std::process::exit(1);
    }
}
