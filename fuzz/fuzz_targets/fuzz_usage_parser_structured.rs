#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ricebar_services::{MemoryReading, parse_free};

#[derive(Arbitrary, Debug)]
enum Field {
    Number(f64),
    Integer(i64),
    Word(String),
    Nan,
    Infinity,
}

impl Field {
    fn render(&self) -> String {
        match self {
            Field::Number(v) => v.to_string(),
            Field::Integer(v) => v.to_string(),
            Field::Word(w) => w.replace('\n', " "),
            Field::Nan => "NaN".to_string(),
            Field::Infinity => "inf".to_string(),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct FreeOutput {
    header: String,
    fields: Vec<Field>,
    trailing: Vec<String>,
}

fuzz_target!(|input: FreeOutput| {
    let mut text = input.header.replace('\n', " ");
    text.push('\n');
    text.push_str("Mem:");
    for field in &input.fields {
        text.push(' ');
        text.push_str(&field.render());
    }
    for line in &input.trailing {
        text.push('\n');
        text.push_str(line);
    }

    let reading = parse_free(&text);
    if let MemoryReading::Sample { total, used, free } = reading {
        assert!(total > 0.0 && total.is_finite());
        assert!(used.is_finite() && free.is_finite());
    }
    assert!(reading.percent() <= 100);
    assert!(!reading.gigabytes_label().contains("NaN"));
});
