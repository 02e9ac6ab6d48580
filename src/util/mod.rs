pub mod process;
pub mod thread;
pub mod timeout;

pub fn pretty_bytes(bytes: &[u8]) -> String {
    bytes.iter().flat_map(|x| std::ascii::escape_default(*x)).map(char::from).collect()
}
