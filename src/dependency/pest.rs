// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

use pest_derive::Parser;

/// Grammar for dependency expressions: a comma separated list of
/// relations, each a pipe separated list of possibilities, each a package
/// name with optional version, architecture and profile constraints.
#[derive(Parser)]
#[grammar_inline = r#"
WHITESPACE = _{ " " | "\t" | NEWLINE }

dependency = { SOI ~ relation ~ ("," ~ relation)* ~ ","? ~ EOI }

relation = { possibility ~ ("|" ~ possibility)* }

possibility = {
    package_name ~ version_constraint? ~ arch_constraints? ~ profile_constraints*
}

package_name = @{ (ASCII_ALPHANUMERIC | "-" | "." | "+" | "_")+ }

version_constraint = { "(" ~ version_operator ~ version ~ ")" }
version_operator   = @{ "<<" | "<=" | ">=" | ">>" | "==" | "=" }
version            = @{ (ASCII_ALPHANUMERIC | "." | "+" | "~" | ":" | "-")+ }

arch_constraints = { "[" ~ arch_constraint+ ~ "]" }
arch_constraint  = @{ "!"? ~ (ASCII_ALPHANUMERIC | "-" | "_")+ }

profile_constraints = { "<" ~ profile_constraint+ ~ ">" }
profile_constraint  = @{ "!"? ~ (ASCII_ALPHANUMERIC | "." | "-")+ }
"#]
pub struct DependencyParser;

// vim: foldmethod=marker
