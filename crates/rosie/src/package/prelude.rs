// Packages compiled into the engine, consulted after the library path

const PRELUDE: [(&str, &str); 3] = [
    ("num", include_str!("../../rpl/num.rpl")),
    ("net", include_str!("../../rpl/net.rpl")),
    ("word", include_str!("../../rpl/word.rpl")),
];

pub fn lookup(path: &str) -> Option<&'static str> {
    PRELUDE
        .iter()
        .find(|(name, _)| *name == path)
        .map(|(_, source)| *source)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PRELUDE.iter().map(|(name, _)| *name)
}
