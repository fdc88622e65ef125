use anyhow::{ensure, Result};
use candle_core::{DType, Tensor};

/// Mean of the unmasked token states, L2-normalised: `[B,T,H]` → `[B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _, hidden_dim) = hidden.dims3()?;
    ensure!(attention_mask.dims2()?.0 == batch, "attention mask batch does not match hidden states");

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let masked = hidden.broadcast_mul(&mask.unsqueeze(2)?)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?;
    let mean = sum.broadcast_div(&lengths)?;

    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(0)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_add(&eps)?;
    let pooled = mean.broadcast_div(&norm)?;
    ensure!(pooled.dims() == [batch, hidden_dim], "unexpected pooled shape {:?}", pooled.dims());
    Ok(pooled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn ignores_masked_positions_and_normalises() {
        let hidden = Tensor::new(&[[[1f32, 0.0], [3.0, 0.0], [100.0, 100.0]]], &Device::Cpu).expect("hidden");
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu).expect("mask");
        let pooled = masked_mean_l2(&hidden, &mask).expect("pool").to_vec2::<f32>().expect("vec");
        assert_eq!(pooled.len(), 1);
        assert!((pooled[0][0] - 1.0).abs() < 1e-6);
        assert!(pooled[0][1].abs() < 1e-6);
    }

    #[test]
    fn rows_are_pooled_independently() {
        let hidden = Tensor::new(&[[[0f32, 2.0], [0.0, 4.0]], [[3.0, 4.0], [9.0, 9.0]]], &Device::Cpu).expect("hidden");
        let mask = Tensor::new(&[[1u32, 1], [1, 0]], &Device::Cpu).expect("mask");
        let pooled = masked_mean_l2(&hidden, &mask).expect("pool").to_vec2::<f32>().expect("vec");
        assert!((pooled[0][1] - 1.0).abs() < 1e-6);
        assert!((pooled[1][0] - 0.6).abs() < 1e-5);
        assert!((pooled[1][1] - 0.8).abs() < 1e-5);
    }
}
