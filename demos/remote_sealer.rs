use remote_sealer::{
    remote_sealer, BlockNonce, Hash, HashrateReport, HexU64, PowMode, Rejection, RemoteEngine,
    SealerConfig, Solution, WorkPackage,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn usage() -> String {
    "Usage: cargo run --example remote_sealer -- [--miners <usize>] [--mode <normal|test|fake>]\n\
     Defaults: --miners 4 --mode normal\n"
        .to_string()
}

/// Toy engine: a new package per accepted seal, any nonce divisible by 7 is a valid seal.
struct ToyEngine {
    current: WorkPackage,
    rates: HashMap<Hash, u64>,
    total: Arc<AtomicU64>,
}

impl ToyEngine {
    fn advance(&mut self) {
        self.current.parent_hash = self.current.pow_hash;
        self.current.number += 1;
        self.current.pow_hash = Hash::random();
    }
}

impl RemoteEngine for ToyEngine {
    fn fetch_work(&mut self) -> Result<WorkPackage, Rejection> {
        Ok(self.current)
    }

    fn submit_work(&mut self, solution: &Solution) -> Result<Hash, Rejection> {
        if solution.pow_hash != self.current.pow_hash || solution.nonce.to_u64() % 7 != 0 {
            return Err(Rejection::invalid_seal());
        }
        let block_hash = Hash::random();
        self.advance();
        Ok(block_hash)
    }

    fn submit_hashrate(&mut self, report: &HashrateReport) {
        self.rates.insert(report.id, report.rate.0);
        self.total
            .store(self.rates.values().sum(), Ordering::Relaxed);
    }
}

fn main() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let mut miners: usize = 4;
    let mut mode = PowMode::Normal;
    while let Some(a) = args.next() {
        match a.as_str() {
            "--miners" => {
                miners = args
                    .next()
                    .ok_or_else(usage)?
                    .parse()
                    .map_err(|_| usage())?
            }
            "--mode" => {
                mode = args
                    .next()
                    .ok_or_else(usage)?
                    .parse()
                    .map_err(|_| usage())?
            }
            _ => return Err(usage()),
        }
    }

    let total = Arc::new(AtomicU64::new(0));
    let config = SealerConfig {
        pow_mode: mode,
        mailbox_capacity: miners,
    };
    let (api, handle) = remote_sealer(&config, total.clone()).map_err(|e| e.to_string())?;

    let engine_total = total.clone();
    let engine = thread::spawn(move || {
        let mut engine = ToyEngine {
            current: WorkPackage {
                pow_hash: Hash::random(),
                seed_hash: Hash([0x5e; 32]),
                target: Hash([0xff; 32]),
                number: 1,
                parent_hash: Hash::default(),
                gas_limit: 30_000_000,
                gas_used: 0,
                tx_count: 0,
                uncle_count: 0,
            },
            rates: HashMap::new(),
            total: engine_total,
        };
        handle.serve(&mut engine)
    });

    let t0 = Instant::now();
    let workers: Vec<_> = (0..miners)
        .map(|index| {
            let api = api.clone();
            thread::spawn(move || {
                let id = Hash::random();
                let mut sealed = 0u32;
                let mut nonce = index as u64;
                while sealed < 3 {
                    let work = match api.get_work() {
                        Ok(work) => work,
                        Err(err) => {
                            println!("miner={index} get_work failed: {err}");
                            return sealed;
                        }
                    };
                    nonce += 1;
                    match api.submit_work_detail(
                        BlockNonce::from_u64(nonce),
                        work.pow_hash,
                        Hash::default(),
                    ) {
                        Ok(block) => {
                            sealed += 1;
                            println!("miner={index} block={} sealed={block}", work.number);
                        }
                        Err(err) if nonce % 7 == 0 => {
                            println!("miner={index} stale: {}", err.reason());
                        }
                        Err(_) => {}
                    }
                }
                api.submit_hash_rate(HexU64(1_000 + index as u64), id);
                sealed
            })
        })
        .collect();

    let sealed: u32 = workers.into_iter().map(|w| w.join().unwrap_or(0)).sum();
    println!(
        "sealed={sealed} combined_hashrate={} time_ms={}",
        api.get_hashrate(),
        t0.elapsed().as_millis()
    );
    drop(api);
    let served = engine.join().map_err(|_| "engine panicked".to_string())?;
    println!("requests_served={served}");
    Ok(())
}
