use criterion::{Criterion, black_box, criterion_group, criterion_main};
use derain_lib::panel::{Composer, PanelSource};
use derain_lib::writer::to_rgb8;
use ndarray::Array4;
use spanet::Prediction;

/// Post-processing cost per sample at the usual 256px width
pub fn panel_benchmarks(c: &mut Criterion) {
    let width = 256;
    let input = Array4::from_shape_fn((1, 3, width, width), |(_, c, y, x)| {
        ((c * 31 + y * 7 + x) % 256) as f32 / 255.0
    });
    let prediction = Prediction {
        attention: Array4::from_shape_fn((1, 1, width, width), |(_, _, y, x)| {
            ((y + x) % 256) as f32 / 255.0
        }),
        output: input.mapv(|v| v * 1.2 - 0.1),
    };
    let composer = Composer::new(width);

    let mut group = c.benchmark_group("panel");

    group.bench_function("compose", |b| {
        b.iter(|| {
            let source = PanelSource {
                input: input.view(),
                prediction: &prediction,
            };
            black_box(composer.compose(&source).unwrap())
        });
    });

    let source = PanelSource {
        input: input.view(),
        prediction: &prediction,
    };
    let panel = composer.compose(&source).unwrap();
    group.bench_function("to_rgb8", |b| {
        b.iter(|| black_box(to_rgb8(panel.view()).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, panel_benchmarks);
criterion_main!(benches);
