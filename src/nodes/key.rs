pub const HUB_NODE_ID: &str = "for_you";
pub const HUB_NODE_LABEL: &str = "For you";

pub fn normalize_node_key(value: &str) -> String {
    collapse_whitespace(&value.to_lowercase().replace('&', "and"))
}

pub fn is_hub_id(value: &str) -> bool {
    let key = normalize_node_key(value).replace(['_', '-'], " ");
    collapse_whitespace(&key) == "for you"
}

pub fn same_node(a: &str, b: &str) -> bool {
    normalize_node_key(a) == normalize_node_key(b)
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
