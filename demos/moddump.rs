use mikmod::{Config, MikMod};
use std::env;

fn main() {
    env_logger::init();

    let mut x = env::args();
    x.next();
    let filename = x.next().unwrap();

    let mikmod = MikMod::with_config(Config::from_env()).unwrap();
    println!("libmikmod {}\n", mikmod.version());

    match mikmod.load_file(&filename) {
        Ok(module) => {
            println!("{}", module);
            module.close().unwrap();
        }
        Err(e) => {
            println!("Error: {}", e);
        }
    }

    mikmod.uninit();
}
