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

//! The `repository` module covers everything between a directory of
//! archives and an upgrade decision: building and reading `index.tar.gz`
//! catalogues, the `sources.list` format and its edit operations, the
//! per-source update state machine, and the upgrade planner comparing
//! installed versions against an index.

mod index;
mod sources;
mod update;
mod upgrade;

pub use index::{create_index, read_index, IndexPackage};
pub use sources::{
    add_sources, load_sources, read_sources, remove_sources, save_sources, write_sources,
    SourceEntry,
};
pub use update::{
    load_update_entries, save_update_entries, update, UpdateEntry, UpdateStatus,
};
pub use upgrade::{upgrade_list, urgent_upgrades, UpgradeClass, UpgradeItem};

// vim: foldmethod=marker
