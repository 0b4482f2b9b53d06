use std::env::vars;

use dotenvy::dotenv;

// Bake .env entries into the binary environment at compile time.
fn main() {
    dotenv().ok();

    for (key, value) in vars() {
        println!("cargo:rustc-env={key}={value}");
    }
}
