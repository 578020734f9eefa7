use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use inbound_drop::parser::form::WebhookRequest;

fn fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_raw_extraction(c: &mut Criterion) {
    let raw = fixture("nested.eml");

    c.bench_function("extract_raw_nested", |b| {
        b.iter(|| inbound_drop::parser::mime::extract_raw_attachments(&raw).unwrap())
    });
}

fn bench_form_decode(c: &mut Criterion) {
    let raw = String::from_utf8(fixture("nested.eml")).unwrap();
    let mut body = String::new();
    body.push_str("--b\r\nContent-Disposition: form-data; name=\"envelope\"\r\n\r\n");
    body.push_str("{\"from\":\"client1@parse.neustar.com\"}\r\n");
    body.push_str("--b\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\n");
    body.push_str(&raw);
    body.push_str("\r\n--b--\r\n");
    let request = WebhookRequest::new("multipart/form-data; boundary=b", body);

    c.bench_function("decode_raw_form", |b| {
        b.iter(|| {
            let payload = request.parse();
            inbound_drop::extract::extract_attachments(&payload).unwrap()
        })
    });
}

criterion_group!(benches, bench_raw_extraction, bench_form_decode);
criterion_main!(benches);
