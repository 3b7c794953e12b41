use std::path::{Path, PathBuf};

use anyhow::{Error, Result};
use bytes::Bytes;
use log::info;
use tokio::{
    fs::{create_dir_all, read, File},
    io::AsyncWriteExt,
};

use crate::{objects::ObjectUrls, status::DownloadLink};

async fn create_parent_dirs_for(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }
    Ok(())
}

pub async fn create_file<P>(name: P) -> Result<File>
where
    P: AsRef<Path>,
{
    create_parent_dirs_for(name.as_ref()).await?;
    let file = File::create(name).await?;
    Ok(file)
}

pub async fn save_file<P, B>(name: P, bytes: B) -> Result<()>
where
    P: AsRef<Path>,
    B: AsRef<[u8]>,
{
    let mut file = create_file(name).await?;
    file.write_all(bytes.as_ref()).await?;
    file.flush().await?;
    Ok(())
}

pub async fn read_file<P>(name: P) -> Result<Bytes>
where
    P: AsRef<Path>,
{
    let bytes = read(name).await?;
    Ok(Bytes::from(bytes))
}

/// The last component of `path`, used as the file name a form would send.
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::msg(format!("`{}` does not name a file.", path.display())))
}

/// Where a download named `file_name` lands inside `dir`.
///
/// Only the final component of `file_name` is kept; the result never leaves `dir`.
pub fn download_path<P>(dir: P, file_name: &str) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let name = file_name_of(Path::new(file_name))?;
    Ok(dir.as_ref().join(name))
}

/// Follow `link` the way a browser download would: write the object it points
/// to under `dir`, then release the handle.
pub async fn save_download<P>(objects: &ObjectUrls, link: &DownloadLink, dir: P) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let bytes = objects
        .resolve(&link.href)
        .ok_or_else(|| Error::msg(format!("{} is no longer available.", link.href)))?;
    let path = download_path(dir, &link.download)?;
    save_file(&path, &bytes).await?;
    objects.revoke(&link.href);
    info!("Saved {} to {}.", link.href, path.display());
    Ok(path)
}
