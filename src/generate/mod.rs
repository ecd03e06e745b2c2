//! Synthetic image generation
//!
//! Builds an image of `N` layers filled with random bytes on top of a
//! minimal base image and loads it into the local Docker daemon. Each layer
//! is one file added by its own `COPY` instruction, so the daemon creates
//! exactly one filesystem layer per file.

use std::collections::HashMap;

use bollard::image::BuildImageOptions;
use bollard::Docker;
use futures::StreamExt;
use rand::RngCore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::{BenchError, BenchResult};

/// Random bytes are produced in chunks of this size
const CHUNK_SIZE: usize = 1024 * 1024;

/// How big the generated image should be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Total size spread evenly over all layers
    Total(u64),
    /// Size of every single layer
    PerLayer(u64),
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub image_name: String,
    pub layer_count: usize,
    pub size: ImageSize,
    pub base_image: String,
}

/// Size of each layer when `image_size` is split over `layer_count` layers
pub fn layer_size(layer_count: usize, image_size: u64) -> BenchResult<u64> {
    if layer_count == 0 {
        return Err(BenchError::config("layer count must be at least one"));
    }
    let layers = layer_count as u64;
    if image_size % layers != 0 {
        return Err(BenchError::config(
            "cannot evenly divide image size into layers",
        ));
    }
    Ok(image_size / layers)
}

impl GenerateOptions {
    pub fn layer_size(&self) -> BenchResult<u64> {
        match self.size {
            ImageSize::Total(total) => layer_size(self.layer_count, total),
            ImageSize::PerLayer(_) if self.layer_count == 0 => {
                Err(BenchError::config("layer count must be at least one"))
            }
            ImageSize::PerLayer(size) => Ok(size),
        }
    }
}

/// Dockerfile appending one layer per generated file to `base_image`
pub fn dockerfile(base_image: &str, layer_count: usize) -> String {
    let mut dockerfile = format!("FROM {}\n", base_image);
    for i in 0..layer_count {
        dockerfile.push_str(&format!("COPY layer-{i} /layer-{i}\n"));
    }
    dockerfile
}

/// Tar build context holding the Dockerfile and one random file per layer
pub fn build_context(base_image: &str, layer_count: usize, layer_size: u64) -> BenchResult<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    let dockerfile = dockerfile(base_image, layer_count);
    append_file(&mut builder, "Dockerfile", dockerfile.len() as u64, dockerfile.as_bytes())?;

    let mut rng = rand::rng();
    for i in 0..layer_count {
        let content = RandomReader {
            rng: &mut rng,
            remaining: layer_size,
        };
        append_file(&mut builder, &format!("layer-{i}"), layer_size, content)?;
        debug!(layer = i, bytes = layer_size, "generated layer");
    }

    Ok(builder.into_inner()?)
}

fn append_file<R: std::io::Read>(
    builder: &mut tar::Builder<Vec<u8>>,
    path: &str,
    size: u64,
    content: R,
) -> BenchResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    builder.append_data(&mut header, path, content)?;
    Ok(())
}

/// Reader yielding `remaining` random bytes
struct RandomReader<'a, R: RngCore> {
    rng: &'a mut R,
    remaining: u64,
}

impl<R: RngCore> std::io::Read for RandomReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(CHUNK_SIZE).min(self.remaining as usize);
        self.rng.fill_bytes(&mut buf[..n]);
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Build the image through the local Docker daemon and tag it
///
/// The build stops with [`BenchError::Cancelled`] once `cancel` fires.
#[instrument(skip(docker, options, cancel), fields(image = %options.image_name, layers = options.layer_count))]
pub async fn generate(
    docker: &Docker,
    options: &GenerateOptions,
    cancel: &CancellationToken,
) -> BenchResult<()> {
    let layer_size = options.layer_size()?;
    if cancel.is_cancelled() {
        return Err(BenchError::Cancelled);
    }
    info!(layer_size, "generating image");

    let context = build_context(&options.base_image, options.layer_count, layer_size)?;
    if cancel.is_cancelled() {
        return Err(BenchError::Cancelled);
    }

    let build_options = BuildImageOptions {
        dockerfile: "Dockerfile".to_string(),
        t: options.image_name.clone(),
        pull: true,
        rm: true,
        forcerm: true,
        ..Default::default()
    };

    let mut stream = docker.build_image(build_options, None::<HashMap<_, _>>, Some(context.into()));
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BenchError::Cancelled),
            next = stream.next() => next,
        };
        let Some(info) = next else {
            break;
        };
        let info = info?;
        if let Some(error) = info.error {
            return Err(BenchError::Build(error));
        }
        if let Some(line) = info.stream.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            debug!("{}", line);
        }
    }

    info!("image written to docker daemon");
    Ok(())
}
