//! Benchmarks for categorization matching and slide layout.
//!
//! Run with: cargo bench -p sortdeck-core

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::DynamicImage;
use sortdeck_core::layout::{compute_placement, BoundingBox, ImageDimensions, SlideSize};
use sortdeck_core::{Categorizer, CategorySet, EmbeddingModel, PipelineError};

const DIM: usize = 768;

struct NullModel;

impl EmbeddingModel for NullModel {
    fn model_id(&self) -> &str {
        "null"
    }

    fn embed_image(&self, _image: &DynamicImage) -> Result<Vec<f32>, PipelineError> {
        Ok(vec![0.0; DIM])
    }

    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(texts.iter().map(|_| vec![0.0; DIM]).collect())
    }
}

fn pseudo_vector(seed: usize) -> Vec<f32> {
    (0..DIM)
        .map(|i| (((i * 31 + seed * 17) % 97) as f32 / 97.0) - 0.5)
        .collect()
}

fn benchmark_best_match(c: &mut Criterion) {
    let labels: Vec<String> = (0..6).map(|i| format!("Category {i}")).collect();
    let embeddings = (0..6).map(pseudo_vector).collect();
    let set = CategorySet::from_embeddings(&labels, embeddings).unwrap();
    let categorizer = Categorizer::new(Arc::new(NullModel), set);
    let image = sortdeck_core::math::l2_normalize(&pseudo_vector(42));

    c.bench_function("best_match_6x768", |b| {
        b.iter(|| categorizer.best_match(black_box(&image)).unwrap())
    });
}

fn benchmark_layout(c: &mut Criterion) {
    let bbox = BoundingBox::new(9.0, 6.5);
    let slide = SlideSize::new(10.0, 7.5);
    let sizes = [
        ImageDimensions::new(1920, 1080),
        ImageDimensions::new(1080, 1920),
        ImageDimensions::new(500, 500),
        ImageDimensions::new(4000, 100),
    ];

    c.bench_function("compute_placement", |b| {
        b.iter(|| {
            for size in sizes {
                let _ = compute_placement(black_box(size), bbox, slide);
            }
        })
    });
}

criterion_group!(benches, benchmark_best_match, benchmark_layout);
criterion_main!(benches);
