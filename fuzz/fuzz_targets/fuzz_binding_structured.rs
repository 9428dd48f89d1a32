#![no_main]

use arbitrary::Arbitrary;
use autoprop_core::{BindingPlan, DependentKeys, extract};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Token {
    Name(u8),
    Each,
    Whole,
    Empty,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Name(n) => format!("k{}", n % 8),
            Token::Each => "@each".to_string(),
            Token::Whole => "[]".to_string(),
            Token::Empty => String::new(),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct Declaration {
    keys: Vec<Vec<Token>>,
    params: Vec<u8>,
}

fuzz_target!(|decl: Declaration| {
    let keys: Vec<String> = decl
        .keys
        .iter()
        .take(16)
        .map(|tokens| {
            tokens
                .iter()
                .take(8)
                .map(Token::text)
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect();
    let params: Vec<String> = decl.params.iter().take(16).map(|n| format!("k{}", n % 8)).collect();

    let extracted = extract(&keys, &params);
    match &extracted {
        DependentKeys::Explicit(found) => assert_eq!(found, &keys),
        DependentKeys::Inferred(found) => assert_eq!(found, &params),
        DependentKeys::None => assert!(keys.is_empty() && params.is_empty()),
    }

    let paths: Vec<autoprop_core::Path> = keys.iter().map(|k| autoprop_core::Path::parse(k)).collect();
    let plan = BindingPlan::by_name(&params, &paths);
    assert_eq!(plan.len(), params.len());
    let resolved: Vec<usize> = (0..paths.len()).collect();
    let args = plan.apply(&resolved, &usize::MAX);
    for (i, arg) in args.iter().enumerate() {
        match plan.source(i) {
            Some(j) => assert_eq!(*arg, j),
            None => assert_eq!(*arg, usize::MAX),
        }
    }
});
