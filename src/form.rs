use std::path::Path;

use anyhow::{Error, Result};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::io::{file_name_of, read_file};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Bytes,
}

impl SelectedFile {
    pub fn new<N, B>(name: N, content: B) -> Self
    where
        N: Into<String>,
        B: Into<Bytes>,
    {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub async fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let name = file_name_of(path.as_ref())?;
        let content = read_file(path).await?;
        Ok(Self { name, content })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(SelectedFile),
}

/// The form's field values at the moment of submit.
///
/// Entries keep their insertion order; a name may repeat, as with `pdfs[]`.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub entries: Vec<(String, FormValue)>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.entries
            .push((name.into(), FormValue::Text(value.into())));
        self
    }

    pub fn file<N>(mut self, name: N, file: SelectedFile) -> Self
    where
        N: Into<String>,
    {
        self.entries.push((name.into(), FormValue::File(file)));
        self
    }

    pub fn files(&self, field: &str) -> Vec<&SelectedFile> {
        self.entries
            .iter()
            .filter(|(name, _)| name == field)
            .filter_map(|(_, value)| match value {
                FormValue::File(file) => Some(file),
                FormValue::Text(_) => None,
            })
            .collect()
    }

    pub fn first_file(&self, field: &str) -> Option<&SelectedFile> {
        self.files(field).into_iter().next()
    }

    pub fn to_multipart(&self) -> Form {
        self.entries
            .iter()
            .fold(Form::new(), |form, (name, value)| match value {
                FormValue::Text(text) => form.text(name.clone(), text.clone()),
                FormValue::File(file) => form.part(
                    name.clone(),
                    Part::bytes(file.content.to_vec()).file_name(file.name.clone()),
                ),
            })
    }
}

/// Split `KEY=VALUE` at the first `=`.
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| Error::msg(format!("Expected `KEY=VALUE`, got `{pair}`.")))?;
    if key.is_empty() {
        return Err(Error::msg(format!("Empty field name in `{pair}`.")));
    }
    Ok((key.to_owned(), value.to_owned()))
}
