use criterion::{criterion_group, criterion_main, Criterion};
use corpus::analyzer::{LanguageAnalyzer, StemmingAnalyzer};
use corpus::postings::build;
use corpus::{InvertedIndex, TokenizedDocument, TokenizedStore};

const SAMPLE: &str = "The crawler walks pages breadth first, the tokenizer turns every page into lemmas \
and the indexer folds those lemmas into postings lists. Running runners run; jumping jumpers jump.";

fn sample_tokens() -> Vec<String> {
    StemmingAnalyzer.lemmatize(&SAMPLE.repeat(20), "en")
}

fn bench_lemmatize(c: &mut Criterion) {
    let text = SAMPLE.repeat(20);
    c.bench_function("lemmatize_sample", |b| b.iter(|| StemmingAnalyzer.lemmatize(&text, "en")));
}

fn bench_add_documents(c: &mut Criterion) {
    let tokens = sample_tokens();
    c.bench_function("add_100_documents", |b| {
        b.iter(|| {
            let mut index = InvertedIndex::new();
            for id in 0..100 {
                index.add_document(id, tokens.iter().map(String::as_str));
            }
            index
        })
    });
}

fn bench_build_from_store(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut store = TokenizedStore::open(dir.path()).expect("open store");
    let tokens = sample_tokens();
    for id in 0..100 {
        store
            .create(TokenizedDocument::new(id, format!("http://bench/{id}"), "en", tokens.clone()))
            .expect("create document");
    }
    c.bench_function("build_from_store_100", |b| b.iter(|| build(&store)));
}

criterion_group!(benches, bench_lemmatize, bench_add_documents, bench_build_from_store);
criterion_main!(benches);
