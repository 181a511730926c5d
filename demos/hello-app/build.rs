// build.rs

fn main() {
    if let Err(err) = hotserve::routegen::generate_for_build("src") {
        panic!("route generation failed: {err}");
    }
}
