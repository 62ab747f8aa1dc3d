use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{BlendMode, ScaleMode};

use pathtracer::camera::Camera;
use pathtracer::config::Config;
use pathtracer::math::Vec3;
use pathtracer::output::Output;
use pathtracer::renderer::Renderer;
use pathtracer::rng::Rng;
use pathtracer::scene::Scene;
use pathtracer::scene_file;

/// CPU Monte-Carlo path tracer.
#[derive(Parser)]
struct Args {
    /// JSON scene description; the built-in demo scene is used if omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// PNG output path; a timestamp-named file is used if omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    samples: Option<u32>,
    #[arg(long)]
    bounces: Option<u32>,
    #[arg(long)]
    threads: Option<u32>,
    #[arg(long = "tile-size")]
    tile_size: Option<u32>,

    /// Skip the SDL2 live-preview window and render headlessly.
    #[arg(long)]
    no_window: bool,
}

impl Args {
    fn config_overlay(&self, mut config: Config) -> Config {
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = self.height {
            config.height = v;
        }
        if let Some(v) = self.samples {
            config.samples = v;
        }
        if let Some(v) = self.bounces {
            config.bounces = v;
        }
        if let Some(v) = self.threads {
            config.threads = v;
        }
        if let Some(v) = self.tile_size {
            config.tile_size = v;
        }
        config
    }
}

/// The "ray tracing in one weekend" final scene: a ground plane plus a field
/// of small random spheres around three feature spheres.
fn build_demo_scene(scene: &mut Scene) {
    let mut rng = Rng::with_seed(0x696969);

    let ground_material = scene.create_diffuse(Vec3::new(0.5, 0.5, 0.5));
    scene.create_sphere(Vec3::new(0.0, -1000.0, 0.0), 1000.0, ground_material);

    let glass = scene.create_dielectric(Vec3::ONE, 1.52);

    for a in -11..11 {
        for b in -11..11 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.next_f32(),
                0.2,
                b as f32 + 0.9 * rng.next_f32(),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() > 0.9 {
                let material_selector = rng.next_f32();
                let material = if material_selector < 0.8 {
                    scene.create_diffuse(rng.next_color() * rng.next_color())
                } else if material_selector < 0.95 {
                    scene.create_metal(rng.next_color() * 0.5 + Vec3::splat(0.5), rng.next_f32() * 0.5)
                } else {
                    glass
                };

                scene.create_sphere(center, 0.2, material);
            }
        }
    }

    scene.create_sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, glass);

    let material2 = scene.create_diffuse(Vec3::new(0.4, 0.2, 0.1));
    scene.create_sphere(Vec3::new(-4.0, 1.0, 0.0), 1.0, material2);

    let material3 = scene.create_metal(Vec3::new(0.7, 0.6, 0.5), 0.0);
    scene.create_sphere(Vec3::new(4.0, 1.0, 0.0), 1.0, material3);
}

fn build_demo_camera(config: &Config) -> Camera {
    let mut camera = Camera::new(config.width, config.height, 20.0, 0.1, 10.0);
    camera.pos = Vec3::new(13.0, 2.0, 3.0);
    camera.target = Vec3::ZERO;
    camera.update();
    camera
}

fn timestamped_filename() -> PathBuf {
    let now = Local::now();
    PathBuf::from(format!("{}.png", now.format("%Y-%m-%d_%H.%M.%S")))
}

fn write_png(output: &Output, path: &PathBuf) {
    match image::save_buffer(
        path,
        output.as_rgba8(),
        output.width,
        output.height,
        image::ColorType::Rgba8,
    ) {
        Ok(()) => println!("wrote to {}", path.display()),
        Err(err) => eprintln!("failed to write to {}: {err}", path.display()),
    }
}

fn run_windowed(renderer: &Renderer, camera: Camera, output: Arc<Output>, config: Config) {
    let sdl = sdl2::init().unwrap();
    let sdl_video = sdl.video().unwrap();

    let window = sdl_video
        .window("pathtracer", 1280, 720)
        .maximized()
        .resizable()
        .build()
        .unwrap();

    let mut canvas = window.into_canvas().present_vsync().build().unwrap();
    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator
        .create_texture_streaming(PixelFormatEnum::RGBA8888, output.width, output.height)
        .unwrap();
    texture.set_blend_mode(BlendMode::Blend);
    texture.set_scale_mode(ScaleMode::Linear);

    let render_output = Arc::clone(&output);
    std::thread::scope(|scope| {
        scope.spawn(|| renderer.render(camera, render_output, config));

        let mut window_sz = canvas.output_size().unwrap();
        let mut pan = (0.0, 0.0);
        let mut zoom = 0.0;

        let mut event_pump = sdl.event_pump().unwrap();
        'running: loop {
            for event in event_pump.poll_iter() {
                match event {
                    Event::MouseMotion {
                        mousestate,
                        xrel,
                        yrel,
                        ..
                    } => {
                        if mousestate.left() {
                            pan.0 += xrel as f64;
                            pan.1 += yrel as f64;
                        }
                    }
                    Event::MouseWheel { precise_y, .. } => {
                        let old_zoom = zoom;
                        zoom = (zoom + precise_y as f64 / 4.0).clamp(-4.0, 4.0);
                        let delta = 2f64.powf(zoom) - 2f64.powf(old_zoom);
                        pan.0 -= delta / 2.0 * window_sz.0 as f64;
                        pan.1 -= delta / 2.0 * window_sz.1 as f64;
                    }
                    Event::KeyDown {
                        keycode: Some(Keycode::R),
                        ..
                    } => {
                        pan = (0.0, 0.0);
                        zoom = 0.0;
                    }
                    Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    }
                    | Event::Quit { .. } => break 'running,
                    Event::Window {
                        win_event: WindowEvent::SizeChanged(..),
                        ..
                    } => {
                        window_sz = canvas.output_size().unwrap();
                    }
                    _ => {}
                }
            }

            texture
                .update(None, output.as_rgba8(), 4 * output.width as usize)
                .unwrap();

            let window_sz_f = (window_sz.0 as f64, window_sz.1 as f64);
            let output_sz = (output.width as f64, output.height as f64);
            let display_sz = if window_sz_f.0 / window_sz_f.1 > output_sz.0 / output_sz.1 {
                (output_sz.0 * window_sz_f.1 / output_sz.1, window_sz_f.1)
            } else {
                (window_sz_f.0, output_sz.1 * window_sz_f.0 / output_sz.0)
            };
            let display_pan = (
                (window_sz_f.0 - display_sz.0) / 2.0,
                (window_sz_f.1 - display_sz.1) / 2.0,
            );
            let rect = Rect::new(
                (pan.0 + display_pan.0) as i32,
                (pan.1 + display_pan.1) as i32,
                (2f64.powf(zoom) * display_sz.0) as u32,
                (2f64.powf(zoom) * display_sz.1) as u32,
            );

            canvas.set_draw_color(Color::RGB(64, 64, 64));
            canvas.clear();
            canvas.set_draw_color(Color::RGB(255, 255, 255));
            canvas.draw_rect(rect).unwrap();
            canvas.copy(&texture, None, rect).unwrap();
            canvas.present();
        }
    });
}

fn main() {
    let args = Args::parse();

    let base_config = args.config_overlay(Config::default());

    let (mut scene, camera, config) = match &args.scene {
        Some(path) => {
            let loaded = scene_file::load(path, base_config).unwrap_or_else(|err| {
                eprintln!("failed to load scene: {err}");
                std::process::exit(1);
            });
            (loaded.scene, loaded.camera, loaded.config)
        }
        None => {
            let mut scene = Scene::new();
            build_demo_scene(&mut scene);
            let camera = build_demo_camera(&base_config);
            (scene, camera, base_config)
        }
    };

    scene.build_bvh();

    let output = Arc::new(Output::new(config.width, config.height));
    let renderer = Renderer::new(Arc::new(scene));

    if args.no_window {
        renderer.render(camera, Arc::clone(&output), config);
    } else {
        run_windowed(&renderer, camera, Arc::clone(&output), config);
    }

    let path = args.output.unwrap_or_else(timestamped_filename);
    write_png(&output, &path);
}
