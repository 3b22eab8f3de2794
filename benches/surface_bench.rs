// Surface Benchmarks
// Frame publication, swapping and software composition

use criterion::{criterion_group, criterion_main, Criterion};
use fblayer::palette::PaletteRegistry;
use fblayer::{FbConfig, SoftwareCompositor, Surface, SurfaceBank};
use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;

/// Helper function to create a showing 384x272 surface on an 800x480 display
fn create_surface() -> (Rc<RefCell<SoftwareCompositor>>, Surface) {
    let compositor = Rc::new(RefCell::new(SoftwareCompositor::new(800, 480)));
    let mut surface = Surface::new(compositor.clone(), PaletteRegistry::shared());
    surface.allocate(384, 272).unwrap();
    surface.show().unwrap();
    (compositor, surface)
}

/// Benchmark the per-frame publish path
fn bench_presentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("presentation");

    group.bench_function("frame_ready_offscreen", |b| {
        let (_compositor, mut surface) = create_surface();
        b.iter(|| {
            surface.frame_ready(black_box(true)).unwrap();
        });
    });

    group.bench_function("swap", |b| {
        let (_compositor, mut surface) = create_surface();
        b.iter(|| {
            surface.swap().unwrap();
        });
    });

    group.bench_function("bank_frames_ready_pair", |b| {
        let compositor = Rc::new(RefCell::new(SoftwareCompositor::new(800, 480)));
        let mut bank = SurfaceBank::from_config(compositor, &FbConfig::default()).unwrap();
        b.iter(|| {
            bank.frames_ready(0, Some(1), true).unwrap();
        });
    });

    group.finish();
}

/// Benchmark software composition of the display list
fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    group.sample_size(20); // Full-display composition is comparatively slow

    group.bench_function("one_surface", |b| {
        let (compositor, mut surface) = create_surface();
        surface.present_frame(true).unwrap();
        let mut frame = vec![0u8; 800 * 480 * 4];
        b.iter(|| {
            compositor.borrow().compose(&mut frame);
            black_box(&frame);
        });
    });

    group.bench_function("opaque_plus_overlay", |b| {
        let compositor = Rc::new(RefCell::new(SoftwareCompositor::new(800, 480)));
        let mut bank = SurfaceBank::from_config(compositor.clone(), &FbConfig::default()).unwrap();
        bank.frames_ready(0, Some(1), true).unwrap();
        let mut frame = vec![0u8; 800 * 480 * 4];
        b.iter(|| {
            compositor.borrow().compose(&mut frame);
            black_box(&frame);
        });
    });

    group.finish();
}

/// Benchmark resource allocation through the compositor trait
fn bench_allocation(c: &mut Criterion) {
    c.bench_function("allocate_and_free", |b| {
        let compositor = Rc::new(RefCell::new(SoftwareCompositor::new(800, 480)));
        let mut surface = Surface::new(compositor.clone(), PaletteRegistry::shared());
        b.iter(|| {
            surface.allocate(black_box(384), black_box(272)).unwrap();
            surface.free().unwrap();
        });
        assert_eq!(compositor.borrow().resource_count(), 0);
    });
}

criterion_group!(benches, bench_presentation, bench_compose, bench_allocation);
criterion_main!(benches);
