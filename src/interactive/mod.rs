//
//  bugz-cli
//  interactive/mod.rs
//

//! Terminal interaction: prompts and the comment editor.

pub mod prompt;
