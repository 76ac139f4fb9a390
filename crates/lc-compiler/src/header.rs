/// Dispatch preamble shared by every transformed script.
///
/// An empty `ARGV`, or one ending in a string, came from an external caller
/// and is used as-is. Anything else is a nested call: the trailing
/// `{keys, argv}` pair is unpacked into the aliases and popped off `ARGV`.
/// Kept on a single line so engine error line numbers still match the source.
pub const DISPATCH_HEADER: &str = concat!(
    " local _KEYS, _ARGV;",
    " if #ARGV == 0 or type(ARGV[#ARGV]) == 'string' then",
    "     _KEYS = KEYS;",
    "     _ARGV = ARGV;",
    " else",
    "     _KEYS = ARGV[#ARGV][1];",
    "     _ARGV = ARGV[#ARGV][2];",
    "     table.remove(ARGV);",
    " end;",
);

pub fn inject_dispatch_header(source: &str) -> String {
    let mut out = String::with_capacity(DISPATCH_HEADER.len() + source.len());
    out.push_str(DISPATCH_HEADER);
    out.push_str(source);
    out
}
