use std::fs;

use bpe_playground::{Error, TrainConfig, Tokenizer, TokenizerDocument};
use serde_json::Value;
use tempfile::tempdir;

const CORPUS: &str = "Manoj lives in Maharashtra. Manoj codes a lot. Maharashtra is big.";

const SAMPLE_INPUTS: [&str; 4] = [
    "My name is <NAME> from <CITY>.",
    "Hello FROM 414001!",
    "Maharashtra is big, Manoj codes.",
    "₹500 or €5?",
];

fn trained() -> Tokenizer {
    let cfg = TrainConfig::new(300).with_specials(["<NAME>", "<CITY>"]);
    Tokenizer::train(CORPUS, &cfg).expect("training should succeed")
}

#[test]
fn save_and_load_reproduces_ids() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("custom_tokenizer.json");
    let tok = trained();
    tok.save(&path).expect("save");

    let loaded = Tokenizer::load(&path).expect("load");
    assert_eq!(loaded.vocab(), tok.vocab());
    assert_eq!(loaded.merges(), tok.merges());
    assert_eq!(loaded.specials(), tok.specials());
    assert_eq!(loaded.vocab_size(), tok.vocab_size());
    for id in 0..tok.vocab_size() {
        assert_eq!(loaded.id_to_token(id), tok.id_to_token(id));
    }
    for text in SAMPLE_INPUTS {
        let enc = tok.encode(text);
        assert_eq!(loaded.encode(text), enc);
        assert_eq!(loaded.decode(&enc.ids), tok.decode(&enc.ids));
    }
}

#[test]
fn document_shape_on_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tok.json");
    let tok = trained();
    tok.save(&path).expect("save");

    let value: Value = serde_json::from_str(&fs::read_to_string(&path).expect("read"))
        .expect("saved file should be JSON");
    let vocab = value["vocab"].as_array().expect("vocab is a list");
    assert_eq!(vocab.len(), tok.vocab().len());
    assert_eq!(vocab[0], Value::String(tok.vocab()[0].clone()));

    let merges = value["merges"].as_array().expect("merges is a list");
    assert_eq!(merges.len(), tok.merges().len());
    assert!(merges.iter().all(|m| m.as_array().is_some_and(|p| p.len() == 2)));

    assert_eq!(value["specials"], serde_json::json!(["<NAME>", "<CITY>"]));
}

#[test]
fn saving_twice_is_byte_identical() {
    let dir = tempdir().expect("tempdir");
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    trained().save(&a).expect("save a");
    Tokenizer::load(&a).expect("load").save(&b).expect("save b");
    assert_eq!(fs::read(&a).expect("read a"), fs::read(&b).expect("read b"));
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempdir().expect("tempdir");
    let err = Tokenizer::load(dir.path().join("absent.json")).expect_err("should fail");
    match err {
        Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected Io, got {other:?}"),
    }
}

#[test]
fn load_malformed_document() {
    let dir = tempdir().expect("tempdir");
    let cases = [
        ("missing_specials.json", r#"{"vocab": ["a"], "merges": []}"#),
        ("bad_pair.json", r#"{"vocab": ["a"], "merges": [["a"]], "specials": []}"#),
        ("not_json.json", "vocab: [a]"),
        ("dup.json", r#"{"vocab": ["a", "a"], "merges": [], "specials": []}"#),
    ];
    for (name, body) in cases {
        let path = dir.path().join(name);
        fs::write(&path, body).expect("write");
        assert!(
            matches!(Tokenizer::load(&path), Err(Error::MalformedDocument(_))),
            "{name} should be malformed"
        );
    }
}

#[test]
fn object_shaped_vocab_loads_in_key_order() {
    let json = r#"{
        "vocab": {"▁": 1, "h": 1, "i": 1, "▁h": 1, "▁hi": 1},
        "merges": [["▁", "h"], ["▁h", "i"]],
        "specials": ["<S>"]
    }"#;
    let tok = Tokenizer::from_json(json).expect("document should load");
    assert_eq!(tok.token_to_id("▁hi"), Some(4));
    assert_eq!(tok.token_to_id("<S>"), Some(5));
    let enc = tok.encode("hi <S>");
    assert_eq!(enc.ids, vec![4, 0, 5]);
    assert_eq!(tok.decode(&enc.ids), "hi <S>");
}

#[test]
fn merges_referencing_unknown_symbols_fall_back_to_chars() {
    // "▁hi" is produced by the merges but missing from the vocabulary
    let doc = TokenizerDocument {
        vocab: vec!["▁".into(), "h".into(), "i".into()],
        merges: vec![
            bpe_playground::MergeRule::new("▁", "h"),
            bpe_playground::MergeRule::new("▁h", "i"),
        ],
        specials: Vec::new(),
    };
    let tok = Tokenizer::from_document(doc).expect("document should load");
    let enc = tok.encode("hi");
    assert_eq!(enc.tokens, vec!["▁hi"]);
    assert_eq!(enc.ids, vec![0, 1, 2]);
    assert_eq!(tok.decode(&enc.ids), "hi");
}
