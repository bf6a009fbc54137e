/*!

# Tessel

Tessel is a toolkit for U-Net semantic segmentation: assembling the
network, feeding it from record files, and serving frozen graphs with a
colored per-pixel output.

## Tessel Core

The core crate builds the U-Net on candle. Every intermediate stage is
recorded under a typed [`Stage`](core::stage::Stage) handle, and the
decoder can upsample with learned, bilinear or nearest-neighbour kernels.

```no_run
use tessel_core::candle::{DType, Device, Tensor};
use tessel_core::candle_nn::{VarBuilder, VarMap};
use tessel_core::{UNet, UNetConfig};

let varmap = VarMap::new();
let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
let net = UNet::new(&UNetConfig::default(), vb)?;

let images = Tensor::zeros((1, 256, 256, 3), DType::F32, &Device::Cpu)?;
let logits = net.logits_t(&images, false)?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Tessel Records

Training examples are stored in a simple length-prefixed record format.
The batch pipeline reads them on a pool of threads and hands out shuffled
batches until the epoch limit is reached.

```no_run
use tessel_records::{BatchPipeline, PipelineConfig};

let pipeline = BatchPipeline::spawn("train.tsrc", PipelineConfig::default())?;
while let Ok(batch) = pipeline.next_batch() {
    println!("{:?}", batch.image_shape());
}
pipeline.shutdown()?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Tessel Frozen and Tessel Vis

Frozen graphs (TensorFlow, ONNX or NNEF) run through tract with a fixed
batch. The driver resizes an image, replicates it over the batch and
colors the argmax of the first slot.

```no_run
use tessel_frozen::{InferenceDriver, TensorBinding};
use tessel_vis::ColorMap;

let driver = InferenceDriver::load(
    "final_model",
    &TensorBinding::default(),
    8,
    (256, 256),
    ColorMap::Voc,
    21,
)?;

let image = tessel_vis::image::open("test.jpg")?.to_rgb8();
driver.run(&image)?.save("predict.png")?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

*/

#![warn(rust_2018_idioms)]

pub use tessel_core as core;
pub use tessel_frozen as frozen;
pub use tessel_records as records;
pub use tessel_vis as vis;
