use std::collections::HashMap;

pub fn builtin_editions() -> HashMap<&'static str, &'static str> {
    HashMap::from([("demo", include_str!("../content/editions/demo.json"))])
}
