use criterion::{black_box, criterion_group, criterion_main, Criterion};
use timelines::candidates::{candidate_pool, window_candidates, TLINK_WINDOW};
use timelines::document::{Mention, RawToken};
use timelines::instances::{dtr_instance, tlink_instance, DTR_RADIUS, TLINK_PAD};
use timelines::offsets::{AlignedTokens, NEWLINE_PLACEHOLDER};

/// Synthetic note of `len` tokens with a chemo mention every 50 tokens and a date every 20
fn synthetic_note(len: usize) -> (Vec<RawToken>, Vec<usize>, Vec<usize>) {
    let mut tokens = Vec::with_capacity(len);
    let mut offset = 0;
    let mut procedures = Vec::new();
    let mut dates = Vec::new();
    for i in 0..len {
        let text = if i % 50 == 7 {
            procedures.push(i);
            "chemo"
        } else if i % 20 == 3 {
            dates.push(i);
            "2020-05"
        } else {
            "word"
        };
        tokens.push(RawToken {
            begin: offset,
            end: offset + text.len(),
            text: text.to_string(),
        });
        offset += text.len() + 1;
    }
    (tokens, procedures, dates)
}

fn bench_instance_building(c: &mut Criterion) {
    // WHY: offset alignment and window rendering run once per mention and pair
    let (raws, procedure_indices, date_indices) = synthetic_note(5_000);

    let mut group = c.benchmark_group("instance_builder");
    group.sample_size(20);

    group.bench_function("align_tokens", |b| {
        b.iter(|| black_box(AlignedTokens::build(&raws, &[], NEWLINE_PLACEHOLDER)))
    });

    let aligned = AlignedTokens::build(&raws, &[], NEWLINE_PLACEHOLDER);
    let focal: Vec<Mention> = procedure_indices
        .iter()
        .map(|&i| Mention::Event { begin: raws[i].begin, end: raws[i].end, text: "chemo" })
        .collect();
    let timexes: Vec<Mention> = date_indices
        .iter()
        .map(|&i| Mention::Timex {
            begin: raws[i].begin,
            end: raws[i].end,
            text: "2020-05",
            normalized: Some("2020-05"),
        })
        .collect();

    group.bench_function("dtr_instances", |b| {
        b.iter(|| {
            for mention in &focal {
                black_box(dtr_instance(&aligned, mention, DTR_RADIUS).ok());
            }
        })
    });

    group.bench_function("tlink_expansion", |b| {
        b.iter(|| {
            let mut rendered = 0usize;
            for (index, mention) in focal.iter().enumerate() {
                let pool = candidate_pool(&focal, index, &timexes);
                if let Ok(candidates) = window_candidates(&aligned, mention, pool, TLINK_WINDOW) {
                    for other in candidates {
                        if tlink_instance(&aligned, mention, other, TLINK_PAD).is_ok() {
                            rendered += 1;
                        }
                    }
                }
            }
            black_box(rendered)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_instance_building);
criterion_main!(benches);
