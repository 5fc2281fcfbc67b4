use std::{thread, time::Duration};

use log::info;
use pledge::{all, make_resolver_promise, Promise, Rejection};

#[derive(Debug)]
struct Unavailable;

fn fetch(name: &'static str, value: u32, delay: Duration) -> Promise<u32> {
    make_resolver_promise(move |resolve, _reject| async move {
        thread::spawn(move || {
            thread::sleep(delay);
            info!("{name} ready");
            resolve.resolve(value);
        });
        Ok(())
    })
}

fn main() {
    env_logger::init();

    let user_id = fetch("user id", 7, Duration::from_millis(120));
    let quota = fetch("quota", 0, Duration::from_millis(60))
        .then(|q| {
            if q == 0 {
                Err(Rejection::new(Unavailable))
            } else {
                Ok(q)
            }
        })
        .catch(|_u: &Unavailable| {
            info!("quota service down, using default");
            Ok(100)
        })
        .finally(|| {
            info!("quota lookup finished");
            Ok(())
        });

    let report = all!(user_id, quota).then(|(id, q)| Ok(format!("user {id}: quota {q}")));

    println!("{}", report.wait().expect("chain settled with a value"));
}
