//! End-to-end translation scenarios: Java source in, Go source out.

use std::sync::Arc;

use j2go_translate::{standard_rules, Config, Translator};

fn translate(src: &str) -> String {
    translate_with(src, Config::default())
}

fn translate_with(src: &str, config: Config) -> String {
    let translator = Translator::new(Arc::new(config));
    let mut program = translator
        .translate_source("Test.go", "Test.java", src)
        .expect("translation failed");
    program.run_rules(&standard_rules());
    program.render()
}

/// Assert that `needles` appear in `haystack` in the given order.
fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut pos = 0;
    for needle in needles {
        match haystack[pos..].find(needle) {
            Some(i) => pos += i + needle.len(),
            None => panic!("expected {:?} (in order) in output:\n{}", needle, haystack),
        }
    }
}

#[test]
fn trivial_class() {
    let out = translate(
        "public class foo { private int val;
           public int getVal() { return val; }
           public foo(int val) { this.val = val; } }",
    );

    assert_in_order(
        &out,
        &[
            "package main",
            "type foo struct {\n\tval int\n}",
            "func (rcvr *foo) GetVal() int {\n\treturn rcvr.val\n}",
            "func NewFoo(val int) *foo {",
            "rcvr := &foo{}",
            "rcvr.val = val",
            "return rcvr",
        ],
    );
}

#[test]
fn main_with_args() {
    let out = translate(
        "public class bar {
           public static void main(String[] args) {
             for (int i=0;i<args.length;i++) System.out.println(args[i]);
           }
         }",
    );

    assert!(out.contains("import \"fmt\""), "missing fmt import:\n{}", out);
    assert!(out.contains("import \"os\""), "missing os import:\n{}", out);
    assert!(out.contains("func main() {"), "missing main:\n{}", out);
    assert!(
        out.contains("for i := 0; i < len(os.Args); i++ {"),
        "bad loop header:\n{}",
        out
    );
    assert!(out.contains("fmt.Println(os.Args[i])"), "bad call:\n{}", out);
}

#[test]
fn string_addition() {
    let out = translate(
        "public class s3 {
           public void show(String x, int y) {
             System.out.println(\"x=\" + x + \",\" + y);
           }
         }",
    );

    // literal-fold then extend: one Println, one Sprintf argument
    assert!(
        out.contains("fmt.Println(fmt.Sprintf(\"%v%v%v%v\", \"x=\", x, \",\", y))"),
        "bad string addition:\n{}",
        out
    );
    assert_eq!(out.matches("fmt.Println").count(), 1);
}

#[test]
fn list_idioms() {
    let out = translate(
        "import java.util.List;
         import java.util.ArrayList;
         public class baz {
           public int run() {
             List<Integer> xs = new ArrayList<>();
             xs.add(3);
             if (xs.isEmpty()) { return 0; }
             int n = xs.size();
             return n;
           }
         }",
    );

    assert!(
        out.contains("xs := []interface{}{}"),
        "list local is not slice-typed:\n{}",
        out
    );
    assert!(out.contains("xs = append(xs, 3)"), "bad add():\n{}", out);
    assert!(out.contains("if len(xs) == 0 {"), "bad isEmpty():\n{}", out);
    assert!(out.contains("n := len(xs)"), "bad size():\n{}", out);
}

#[test]
fn overload_renumbering() {
    let out = translate(
        "public class qux {
           public int f(int x) { return x; }
           public int f(String s) { return 0; }
         }",
    );

    assert!(
        out.contains("func (rcvr *qux) F(x int) int {"),
        "first overload renamed:\n{}",
        out
    );
    assert!(
        out.contains("func (rcvr *qux) F2(s string) int {"),
        "second overload not renumbered:\n{}",
        out
    );
}

#[test]
fn cast_with_panic_check() {
    let out = translate(
        "public class c6 {
           public Object pick(Object obj) {
             Foo f = (Foo) obj;
             return f;
           }
         }",
    );

    assert_in_order(&out, &["f, ok := obj.(*Foo)", "if !ok {", "panic("]);
}

#[test]
fn empty_source_emits_package_clause_only() {
    let out = translate("");
    assert_eq!(out.trim(), "package main");
}

#[test]
fn class_without_constructors_gets_one() {
    let out = translate("public class Box { public int get() { return 1; } }");

    assert!(
        out.contains("func NewBox() *Box {"),
        "missing generated constructor:\n{}",
        out
    );
    assert!(out.contains("rcvr := &Box{}"), "{}", out);
    assert!(out.contains("return rcvr"), "{}", out);
    // exactly one constructor
    assert_eq!(out.matches("func NewBox(").count(), 1);
}

#[test]
fn inheritance_embeds_super_pointer() {
    let out = translate(
        "public class Base { public Base() { } }
         public class Derived extends Base {
           public Derived() { super(); }
         }",
    );

    assert!(
        out.contains("type Derived struct {\n\t*Base\n}"),
        "missing embedded super:\n{}",
        out
    );
    assert_in_order(
        &out,
        &[
            "func NewDerived() *Derived {",
            "rcvr := &Derived{}",
            "rcvr.Base = NewBase()",
            "return rcvr",
        ],
    );
}

#[test]
fn field_initializer_moves_into_constructor() {
    let out = translate(
        "public class cf {
           public static final int MAX = 10;
           private static int count;
           public int x = 5;
           public cf() { }
         }",
    );

    assert!(out.contains("const MAX int = 10"), "{}", out);
    assert!(out.contains("var count int"), "{}", out);
    assert_in_order(&out, &["rcvr := &cf{}", "rcvr.X = 5", "return rcvr"]);
}

#[test]
fn enum_becomes_iota_block() {
    let out = translate("public enum Color { RED, GREEN, BLUE }");

    assert!(out.contains("type Color int"), "{}", out);
    assert_in_order(&out, &["RED Color = iota", "GREEN", "BLUE"]);
}

#[test]
fn interface_methods_are_signatures() {
    let out = translate(
        "public interface Shape {
           int area(int scale);
           int SIDES = 4;
         }",
    );

    assert!(
        out.contains("const SIDES int = 4"),
        "missing interface constant:\n{}",
        out
    );
    assert!(
        out.contains("type Shape interface {\n\tArea(scale int) int\n}"),
        "bad interface decl:\n{}",
        out
    );
}

#[test]
fn while_and_do_while() {
    let out = translate(
        "public class dw {
           public int count(int n) {
             int i = 0;
             while (i < n) { i++; }
             do { i++; } while (i < 2 * n);
             return i;
           }
         }",
    );

    assert!(out.contains("for i < n {"), "bad while:\n{}", out);
    assert_in_order(&out, &["for {", "i++", "if !(i < 2 * n)", "break"]);
}

#[test]
fn do_while_condition_is_parenthesized() {
    let out = translate(
        "public class dw2 {
           public void spin(int n) { do { n--; } while (n > 0); }
         }",
    );
    assert!(out.contains("if !(n > 0) {"), "{}", out);
}

#[test]
fn switch_fallthrough_and_break() {
    let out = translate(
        "public class sw {
           public int pick(int x) {
             switch (x) {
             case 1: x = 10;
             case 2: x += 1; break;
             default: x = 0;
             }
             return x;
           }
         }",
    );

    assert!(out.contains("switch x {"), "{}", out);
    // case 1 and the default fall through; case 2's break is stripped
    // without gaining a fallthrough
    assert_in_order(
        &out,
        &[
            "case 1:",
            "x = 10",
            "fallthrough",
            "case 2:",
            "x += 1",
            "default:",
            "x = 0",
        ],
    );
    assert_eq!(out.matches("fallthrough").count(), 2, "{}", out);
    assert!(!out.contains("break"), "break should be stripped:\n{}", out);
}

#[test]
fn instanceof_in_if_condition() {
    let out = translate(
        "public class io {
           public boolean check(Object o) {
             if (o instanceof String) { return true; }
             return false;
           }
         }",
    );

    assert!(
        out.contains("if _, ok := o.(String); ok {"),
        "bad instanceof lowering:\n{}",
        out
    );
}

#[test]
fn try_catch_finally_fake_calls() {
    let out = translate(
        "public class tc {
           public void risky() {
             try { throw new Exception(\"x\"); }
             catch (Exception e) { }
             finally { }
           }
         }",
    );

    assert_in_order(
        &out,
        &[
            "if try() {",
            "throw(NewException(\"x\"))",
            "} else if catch_Exception(e) {",
            "} else if finally() {",
        ],
    );
}

#[test]
fn synchronized_is_advisory() {
    let out = translate(
        "public class sy {
           private Object lock;
           public void enter() { synchronized (lock) { } }
         }",
    );

    assert!(
        out.contains("if synchronized(rcvr.lock) {"),
        "bad synchronized lowering:\n{}",
        out
    );
}

#[test]
fn string_format_becomes_sprintf() {
    let out = translate(
        "public class sf {
           public String pad(int x) { return String.format(\"%d\", x); }
         }",
    );

    assert!(
        out.contains("fmt.Sprintf(\"%d\", x)"),
        "bad String.format:\n{}",
        out
    );
    assert!(out.contains("import \"fmt\""), "{}", out);
}

#[test]
fn class_qualified_tostring() {
    let out = translate(
        "public class ts {
           public String s(int x) { return Integer.toString(x); }
         }",
    );

    assert!(
        out.contains("fmt.Sprintf(\"%v\", x)"),
        "bad toString:\n{}",
        out
    );
}

#[test]
fn unsigned_shift_casts_left_operand() {
    let out = translate(
        "public class us {
           public int shift(int x) { return x >>> 2; }
         }",
    );

    assert!(out.contains("uint32(x) >> 2"), "missing uint32 cast:\n{}", out);
}

#[test]
fn plain_shift_is_untouched() {
    let out = translate(
        "public class ps {
           public int shift(int x) { return x >> 2; }
         }",
    );

    assert!(out.contains("x >> 2"), "{}", out);
    assert!(!out.contains("uint32"), "plain >> must not cast:\n{}", out);
}

#[test]
fn test_annotation_gets_testing_signature() {
    let out = translate(
        "public class tt {
           @Test
           public void checkSomething() { }
         }",
    );

    assert!(out.contains("import \"testing\""), "{}", out);
    assert!(
        out.contains("func CheckSomething(t *testing.T) {"),
        "bad test signature:\n{}",
        out
    );
}

#[test]
fn unmapped_expression_becomes_placeholder() {
    let out = translate(
        "public class up {
           public int choose(boolean b) { return b ? 1 : 2; }
         }",
    );

    assert!(out.contains("<<unimp_"), "missing visible placeholder:\n{}", out);
}

#[test]
fn receiver_and_package_config() {
    let config = Config::from_reader(
        "PACKAGE com.example -> widgets
         RECEIVER com.example.Widget -> w
        "
        .as_bytes(),
    );

    let out = translate_with(
        "package com.example;
         public class Widget {
           private int id;
           public int getId() { return id; }
         }",
        config,
    );

    assert!(out.contains("package widgets"), "{}", out);
    assert!(
        out.contains("func (w *Widget) GetId() int {\n\treturn w.id\n}"),
        "receiver override not applied:\n{}",
        out
    );
}

#[test]
fn configured_interface_type() {
    let config = Config::from_reader(
        "PACKAGE x.y -> xy
         INTERFACE xy.Runner
        "
        .as_bytes(),
    );

    let out = translate_with(
        "import x.y.Runner;
         public class holder { private Runner target; }",
        config,
    );

    // interfaces are bare names, classes would be pointers
    assert!(
        out.contains("target xy.Runner"),
        "interface field should not be a pointer:\n{}",
        out
    );
    assert!(out.contains("import \"xy\""), "{}", out);
}

#[test]
fn anonymous_class_is_hoisted() {
    let out = translate(
        "public class ac {
           public void go() {
             Object r = new Thing() { };
           }
         }",
    );

    assert!(
        out.contains("NewAnonymous_Thing_0()"),
        "anonymous allocation site:\n{}",
        out
    );
    assert!(
        out.contains("type Anonymous_Thing_0 struct"),
        "anonymous class not hoisted:\n{}",
        out
    );
}

#[test]
fn parse_error_skips_file() {
    let translator = Translator::new(Arc::new(Config::default()));
    let err = translator
        .translate_source("Bad.go", "Bad.java", "public class { nope")
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("Parse error"), "unexpected error: {}", text);
    assert!(text.contains("Bad.java"), "{}", text);
}

#[test]
fn rewrite_pipeline_is_idempotent() {
    let src = "public class idem {
                 public static void main(String[] args) {
                   System.out.println(\"a\" + \"b\" + args.length);
                 }
               }";

    let translator = Translator::new(Arc::new(Config::default()));
    let mut once = translator
        .translate_source("Test.go", "Test.java", src)
        .unwrap();
    once.run_rules(&standard_rules());
    let first = once.render();

    once.run_rules(&standard_rules());
    let second = once.render();

    assert_eq!(first, second);
}
