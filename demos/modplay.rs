use mikmod::{Config, MikMod};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();

    let mut x = env::args();
    x.next();
    let filename = x.next().unwrap();
    let from_memory = x.next().as_deref() == Some("--mem");

    let mikmod = MikMod::with_config(Config::from_env()).unwrap();

    {
        let loaded = if from_memory {
            let data = fs::read(&filename).unwrap();
            mikmod.load_slice(&data)
        } else {
            mikmod.load_file(&filename)
        };

        match loaded {
            Ok(module) => {
                println!("Playing {} ({})", module.title(), module.tracker());
                let player = mikmod.player();
                player.play(&module);
                while player.is_playing() {
                    print!(
                        "\r{:>4}s  pos {:>3}/{:<3} row {:>2}  speed {:>2} tempo {:>3}",
                        module.elapsed().as_secs(),
                        module.position(),
                        module.num_positions(),
                        module.row(),
                        module.speed(),
                        module.tempo()
                    );
                    io::stdout().flush().ok();
                    thread::sleep(Duration::from_millis(100));
                }
                println!();
                player.stop();
                module.close().unwrap();
            }
            Err(e) => {
                println!("Error: {}", e);
            }
        }
    }

    mikmod.uninit();
}
