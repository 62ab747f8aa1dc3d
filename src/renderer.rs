//! Tile-parallel worker pool. Workers are launched lazily on the first
//! `render()` call, reused by later calls, and joined on `Drop` via one
//! shutdown sentinel pushed through the same FIFO the tiles travel through.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::camera::Camera;
use crate::config::Config;
use crate::integrator::{post_process, to_color, trace};
use crate::math::Vec3;
use crate::output::Output;
use crate::rng::Rng;
use crate::scene::Scene;
use crate::tile::{row_major_tiles, Tile};
use crate::timer::Timer;

struct RenderJob {
    camera: Camera,
    output: Arc<Output>,
    config: Config,
}

enum WorkItem {
    Tile(Tile, Arc<RenderJob>),
    Shutdown,
}

struct Queue {
    items: Mutex<VecDeque<WorkItem>>,
    signal: Condvar,
}

impl Queue {
    fn new() -> Queue {
        Queue {
            items: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
        }
    }

    fn push(&self, item: WorkItem) {
        self.items.lock().unwrap().push_back(item);
        self.signal.notify_one();
    }

    fn wait(&self) -> WorkItem {
        let mut items = self.items.lock().unwrap();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = self.signal.wait(items).unwrap();
        }
    }
}

/// `remaining` counts down from the tile count pushed for the in-flight
/// render; the decrement and the condvar notification happen under the same
/// lock so the main thread never misses a wakeup.
struct CompletionBarrier {
    remaining: Mutex<u32>,
    signal: Condvar,
}

impl CompletionBarrier {
    fn new() -> CompletionBarrier {
        CompletionBarrier {
            remaining: Mutex::new(0),
            signal: Condvar::new(),
        }
    }

    fn reset(&self, total: u32) {
        *self.remaining.lock().unwrap() = total;
    }

    fn complete_one(&self) {
        let mut remaining = self.remaining.lock().unwrap();
        *remaining -= 1;
        self.signal.notify_all();
    }

    /// Blocks until the counter reaches zero, calling `on_wake` with the
    /// current remaining count on every spurious or real wakeup (at least
    /// every 250ms) so the caller can drive its own ">= 4s" progress gate.
    fn wait_until_zero(&self, mut on_wake: impl FnMut(u32)) {
        let mut remaining = self.remaining.lock().unwrap();
        loop {
            on_wake(*remaining);
            if *remaining == 0 {
                return;
            }
            let (guard, _timed_out) = self
                .signal
                .wait_timeout(remaining, std::time::Duration::from_millis(250))
                .unwrap();
            remaining = guard;
        }
    }
}

/// Owns the shared tile queue and completion barrier for a scene's render
/// jobs. A single `Renderer` can drive any number of sequential `render()`
/// calls against the same scene; the worker pool persists across them.
pub struct Renderer {
    scene: Arc<Scene>,
    queue: Arc<Queue>,
    barrier: Arc<CompletionBarrier>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Renderer {
    pub fn new(scene: Arc<Scene>) -> Renderer {
        Renderer {
            scene,
            queue: Arc::new(Queue::new()),
            barrier: Arc::new(CompletionBarrier::new()),
            threads: Mutex::new(Vec::new()),
        }
    }

    fn ensure_workers(&self, thread_count: u32) {
        let mut threads = self.threads.lock().unwrap();
        if !threads.is_empty() {
            return;
        }

        println!("launching {thread_count} threads");

        for i in 0..thread_count {
            let scene = Arc::clone(&self.scene);
            let queue = Arc::clone(&self.queue);
            let barrier = Arc::clone(&self.barrier);

            let handle = thread::Builder::new()
                .name(format!("pathtracer-worker-{i}"))
                .spawn(move || worker_loop(&scene, &queue, &barrier))
                .expect("failed to spawn render worker");

            threads.push(handle);
        }
    }

    /// Renders `scene` through `camera` into `output`, blocking until every
    /// tile has been written. Safe to call more than once on the same
    /// `Renderer`; the worker pool is launched once and reused.
    pub fn render(&self, camera: Camera, output: Arc<Output>, config: Config) {
        let tiles = row_major_tiles(output.width, output.height, config.tile_size);
        let total_tiles = tiles.len() as u32;

        let thread_count = if config.threads == 0 {
            thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(1)
        } else {
            config.threads
        };
        self.ensure_workers(thread_count);

        println!("total tiles: {total_tiles}");
        self.barrier.reset(total_tiles);

        let job = Arc::new(RenderJob {
            camera,
            output,
            config,
        });

        let timer = Timer::new();
        for tile in tiles {
            self.queue.push(WorkItem::Tile(tile, Arc::clone(&job)));
        }

        let mut prev_remaining = total_tiles;
        let mut prev_elapsed = 0.0f64;

        self.barrier.wait_until_zero(|remaining| {
            if remaining == 0 {
                return;
            }
            let elapsed = timer.elapsed_secs();
            if elapsed - prev_elapsed > 4.0 {
                let tiles_per_sec = (prev_remaining - remaining) as f64 / (elapsed - prev_elapsed);
                let eta = remaining as f64 / tiles_per_sec;
                println!(
                    "remaining tiles: {remaining} (total time {:.0} ms, {tiles_per_sec:.2} tiles/sec, estimated {eta:.1} sec remaining)",
                    elapsed * 1000.0
                );
                prev_elapsed = elapsed;
                prev_remaining = remaining;
            }
        });

        let total_time = timer.elapsed_secs();
        let tiles_per_sec = total_tiles as f64 / total_time;
        println!("render time: {:.0} ms, {tiles_per_sec:.2} tiles/sec", total_time * 1000.0);
    }
}

fn worker_loop(scene: &Scene, queue: &Queue, barrier: &CompletionBarrier) {
    let mut rng = Rng::new();

    loop {
        let (tile, job) = match queue.wait() {
            WorkItem::Shutdown => break,
            WorkItem::Tile(tile, job) => (tile, job),
        };

        for y in tile.start_y..tile.end_y {
            for x in tile.start_x..tile.end_x {
                let mut sum = Vec3::ZERO;
                for _ in 0..job.config.samples {
                    let ray = job.camera.ray(&mut rng, x, y);
                    sum += trace(scene, ray, &mut rng, job.config.bounces);
                }
                let color = to_color(post_process(sum, &job.config));
                job.output.put(x, y, color);
            }
        }

        barrier.complete_one();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let mut threads = self.threads.lock().unwrap();
        for _ in threads.iter() {
            self.queue.push(WorkItem::Shutdown);
        }
        for handle in threads.drain(..) {
            handle.join().expect("render worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn sixty_four_square_render_covers_every_pixel_exactly_once() {
        let mut scene = Scene::new();
        let diffuse = scene.create_diffuse(Vec3::new(0.8, 0.8, 0.8));
        scene.create_sphere(Vec3::new(0.0, 0.0, -1.0), 0.5, diffuse);
        scene.build_bvh();

        let mut camera = Camera::new(64, 64, 40.0, 0.0, 1.0);
        camera.update();

        let output = Arc::new(Output::new(64, 64));
        for y in 0..64 {
            for x in 0..64 {
                output.put(x, y, 0xDEAD_BEEF);
            }
        }

        let renderer = Renderer::new(Arc::new(scene));
        renderer.render(
            camera,
            Arc::clone(&output),
            Config {
                samples: 2,
                bounces: 4,
                threads: 2,
                tile_size: 16,
                ..Config::default()
            },
        );

        for y in 0..64 {
            for x in 0..64 {
                assert_ne!(output.get(x, y), 0xDEAD_BEEF);
            }
        }
    }

    #[test]
    fn renderer_can_be_driven_more_than_once() {
        let mut scene = Scene::new();
        let diffuse = scene.create_diffuse(Vec3::ONE);
        scene.create_sphere(Vec3::ZERO, 1.0, diffuse);
        scene.build_bvh();

        fn make_camera() -> Camera {
            let mut camera = Camera::new(16, 16, 40.0, 0.0, 5.0);
            camera.update();
            camera
        }

        let renderer = Renderer::new(Arc::new(scene));
        let config = Config {
            samples: 1,
            bounces: 2,
            threads: 1,
            tile_size: 8,
            ..Config::default()
        };

        let output_a = Arc::new(Output::new(16, 16));
        renderer.render(make_camera(), Arc::clone(&output_a), config);

        let output_b = Arc::new(Output::new(16, 16));
        renderer.render(make_camera(), Arc::clone(&output_b), config);

        assert_eq!(output_a.get(8, 8), output_b.get(8, 8));
    }
}
