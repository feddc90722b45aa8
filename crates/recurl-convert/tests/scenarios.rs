//! End-to-end behavior of the converters through the registry.

use recurl_convert::registry::converter_for_name;
use recurl_convert::to_python::engine::dedent_blocks;
use recurl_convert::Converter;
use recurl_core::buffer::CharBuffer;
use recurl_core::config::ConverterConfig;

fn converter(name: &str) -> Box<dyn Converter> {
    converter_for_name(name, ConverterConfig::default()).unwrap()
}

fn convert(name: &str, src: &str) -> String {
    converter(name).convert(src).unwrap()
}

// ============================================================================
// Indent to brace
// ============================================================================

#[test]
fn if_block_gets_braces() {
    assert_eq!(
        convert("python-to-typescript", "if (x > 0):\n    y = 1\nz = 2\n"),
        "if (x > 0) {\n    const y = 1;\n}\nconst z = 2;\n"
    );
}

#[test]
fn init_becomes_constructor() {
    assert_eq!(
        convert(
            "python-to-typescript",
            "def __init__(self, x=None):\n    self.x = x\n"
        ),
        "public constructor(x=null) {\n    this.x = x;\n}\n"
    );
}

#[test]
fn no_semicolon_after_continuation_lines() {
    let src = "items = [\n    1,\n    2,\n]\nok = (a and\n    b)\n";
    let out = convert("python-to-typescript", src);
    for line in out.lines() {
        for end in ["{", "(", "[", ":", ",", "\\", "||", "&&", "!"] {
            assert!(
                !line.ends_with(&format!("{};", end)),
                "line {:?} in\n{}",
                line,
                out
            );
        }
    }
}

// ============================================================================
// Brace to indent
// ============================================================================

#[test]
fn member_constructor_takes_self() {
    assert_eq!(
        convert("c-to-python", "int Foo::Foo(int x) {\n    y = x;\n}\n"),
        "def __init__(self,x):\n    y = x\n"
    );
}

#[test]
fn class_context_does_not_outlive_its_unit() {
    let mut config = ConverterConfig::default();
    config.ivars.insert("Foo".to_string(), vec!["n".to_string()]);
    let mut conv = converter_for_name("c-to-python", config).unwrap();
    let out = conv.convert("void Foo::inc() {\n    n = n + 1;\n}\n").unwrap();
    assert_eq!(out, "def inc(self):\n    self.n = self.n + 1\n");
    let out = conv.convert("int helper() {\n    return n;\n}\n").unwrap();
    assert_eq!(out, "def helper():\n    return n\n");
}

#[test]
fn line_comment_keeps_leading_whitespace() {
    assert_eq!(
        convert("c-to-python", "    // this is a comment\nx = 1;\n"),
        "    # this is a comment\nx = 1\n"
    );
}

#[test]
fn string_literals_are_not_translated() {
    assert_eq!(
        convert("ts-to-python", "x = \"true\";\ny = true;\n"),
        "x = \"true\"\ny = True\n"
    );
}

#[test]
fn bare_block_markers_keep_line_count() {
    let src = " {\n    a;\n    {\n        b;\n    }\n    c;\n}";
    let mut body = CharBuffer::from(src);
    dedent_blocks(&mut body);
    let out = body.to_string();
    assert_eq!(out.lines().count(), src.lines().count());
    assert!(out.contains("    # <Start dedented block>...\n    b;\n    # <End dedented block>\n"));
}

// ============================================================================
// Annotations
// ============================================================================

#[test]
fn annotations_are_idempotent() {
    let once = convert("add-annotations", "def f(a, b=True):\n    return a\n");
    assert_eq!(once, "def f(a: Any, b: bool=True) -> Any:\n    return a\n");
    assert_eq!(convert("add-annotations", &once), once);
}

// ============================================================================
// Unit independence
// ============================================================================

/// Units per converter; the first of each leaves the most state behind.
const UNITS: &[(&str, &[&str])] = &[
    (
        "c-to-python",
        &[
            "void Foo::inc() {\n    n = n + 1;\n}\n",
            "int helper(int a) {\n    return n + a;\n}\n",
            "// note\nint x = (int) y;\n",
        ],
    ),
    (
        "ts-to-python",
        &[
            "class Foo extends Bar {\n    get(a: number): number {\n        return this.a;\n    }\n",
            "function g(b) {\n    return b;\n}\n",
            "}\nx = null;\n",
        ],
    ),
    (
        "python-to-typescript",
        &[
            "class A(B):\n    def f(self, x=None):\n        '''doc'''\n        return self.x\n",
            "def g(x):\n    if x:\n        return f\"{x}\"\n",
            "y = 1 if z else 2\n",
        ],
    ),
    (
        "add-annotations",
        &[
            "def __init__(self, x=1.5):\n    pass\n",
            "def f(a, b=True, c='s'):\n    return a\n",
            "def g(\n    a,  # first\n    b=None,\n):\n    pass\n",
        ],
    ),
];

fn mixed_config() -> ConverterConfig {
    let mut config = ConverterConfig::default();
    config.ivars.insert("Foo".to_string(), vec!["n".to_string()]);
    config.types.insert("a".to_string(), "int".to_string());
    config
}

#[test]
fn output_depends_only_on_the_unit() {
    for (name, units) in UNITS {
        let fresh: Vec<String> = units
            .iter()
            .map(|u| {
                converter_for_name(name, mixed_config())
                    .unwrap()
                    .convert(u)
                    .unwrap()
            })
            .collect();

        let mut conv = converter_for_name(name, mixed_config()).unwrap();
        for (unit, expected) in units.iter().zip(&fresh) {
            assert_eq!(&conv.convert(unit).unwrap(), expected, "{} in order: {:?}", name, unit);
        }
        for (unit, expected) in units.iter().zip(&fresh).rev() {
            assert_eq!(&conv.convert(unit).unwrap(), expected, "{} reversed: {:?}", name, unit);
        }
        for (unit, expected) in units.iter().zip(&fresh) {
            assert_eq!(&conv.convert(unit).unwrap(), expected, "{} repeated: {:?}", name, unit);
        }
    }
}
