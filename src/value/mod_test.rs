use super::*;

#[test]
fn nil_is_the_default_value() {
    assert_eq!(Value::default(), Value::Nil);
    assert!(Value::Nil.is_nil());
}

#[test]
fn immediates_have_no_heap_ref() {
    assert_eq!(Value::Nil.heap_ref(), None);
    assert_eq!(Value::Integer(42).heap_ref(), None);
    assert_eq!(
        Value::Pointer(Pointer::new(0x1000, PointerSubtype::U8)).heap_ref(),
        None
    );
}

#[test]
fn heap_variants_carry_their_reference() {
    let r = HeapRef(7);
    assert_eq!(Value::List(r).heap_ref(), Some(r));
    assert_eq!(Value::Table(r).heap_ref(), Some(r));
    assert!(Value::List(r).is_heap());
    assert!(!Value::Integer(1).is_heap());
}

#[test]
fn type_names_are_distinct() {
    let r = HeapRef(0);
    let names = [
        Value::Nil.type_name(),
        Value::Integer(0).type_name(),
        Value::Pointer(Pointer::new(0, PointerSubtype::Unknown)).type_name(),
        Value::List(r).type_name(),
        Value::Vector(r).type_name(),
        Value::Table(r).type_name(),
        Value::Symbol(r).type_name(),
        Value::Text(r).type_name(),
        Value::Bytes(r).type_name(),
        Value::Module(r).type_name(),
        Value::Function(r).type_name(),
        Value::Primitive(r).type_name(),
        Value::Continuation(r).type_name(),
    ];
    for (i, a) in names.iter().enumerate() {
        for (j, b) in names.iter().enumerate() {
            if i != j {
                assert_ne!(a, b);
            }
        }
    }
}
