use criterion::{black_box, criterion_group, criterion_main, Criterion};

use grishex::value::Value;
use grishex::vm::Vm;
use grishex::{compile_source, parse, tokenize, Compiler};

const TOKEN_SOURCE: &str = r#"
pragma grishex 1;

contract SimpleToken {
    state {
        name: string;
        symbol: string;
        decimals: uint;
        total: uint;
    }

    constructor(name: string, symbol: string, decimals: uint) {
        self.name = name;
        self.symbol = symbol;
        self.decimals = decimals;
        self.total = 0;
    }

    function mint(amount: uint) {
        require(amount > 0, "amount must be positive");
        self.total = self.total + amount;
    }

    function getTotal() view returns uint {
        return self.total;
    }
}
"#;

fn bench_pipeline(c: &mut Criterion) {
    c.bench_function("tokenize", |b| b.iter(|| tokenize(black_box(TOKEN_SOURCE))));

    let tokens = tokenize(TOKEN_SOURCE);
    c.bench_function("parse", |b| b.iter(|| parse(black_box(tokens.clone()))));

    let (program, _) = parse(tokens.clone());
    c.bench_function("compile", |b| {
        b.iter(|| {
            let mut compiler = Compiler::new();
            compiler.compile(black_box(&program))
        })
    });

    let bytecode = compile_source(TOKEN_SOURCE).expect("benchmark source compiles");
    c.bench_function("deploy_and_execute", |b| {
        b.iter(|| {
            let mut vm = Vm::new();
            vm.load_contract(&bytecode);
            vm.deploy_contract(
                "SimpleToken",
                vec![
                    Value::Str("Grishinium Token".into()),
                    Value::Str("GRISH".into()),
                    Value::Uint(18),
                ],
            )
            .unwrap();
            for _ in 0..100 {
                vm.execute_function("SimpleToken", "mint", vec![Value::Uint(5)], None)
                    .unwrap();
            }
            vm.execute_function("SimpleToken", "getTotal", vec![], None).unwrap()
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
