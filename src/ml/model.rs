use anyhow::{ensure, Result};
use burn::{
    nn::{
        attention::{
            generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig,
        },
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::gelu,
};

use crate::ml::seq2seq::{argmax_excluding, shift_right, GenerationOptions, Seq2SeqModel, Seq2SeqOutput};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct KeywordTransformerConfig {
    pub vocab_size:       usize,
    /// Longest transcription the encoder accepts (L_in)
    pub max_source_len:   usize,
    /// Longest decoder sequence, labels and generated output alike
    pub max_target_len:   usize,
    pub pad_id:           usize,
    pub decoder_start_id: usize,
    pub eos_id:           usize,
    #[config(default = 256)]
    pub d_model:          usize,
    #[config(default = 8)]
    pub num_heads:        usize,
    #[config(default = 3)]
    pub encoder_layers:   usize,
    #[config(default = 3)]
    pub decoder_layers:   usize,
    #[config(default = 1024)]
    pub d_ff:             usize,
    #[config(default = 0.1)]
    pub dropout:          f64,
}

impl KeywordTransformerConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> KeywordTransformer<B> {
        let token_embedding   = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let encoder_positions = EmbeddingConfig::new(self.max_source_len, self.d_model).init(device);
        let decoder_positions = EmbeddingConfig::new(self.max_target_len, self.d_model).init(device);
        let encoder = (0..self.encoder_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let decoder = (0..self.decoder_layers)
            .map(|_| self.build_decoder_block(device))
            .collect();
        KeywordTransformer {
            token_embedding,
            encoder_positions,
            decoder_positions,
            encoder,
            decoder,
            encoder_norm: LayerNormConfig::new(self.d_model).init(device),
            decoder_norm: LayerNormConfig::new(self.d_model).init(device),
            lm_head:      LinearConfig::new(self.d_model, self.vocab_size).init(device),
            dropout:      DropoutConfig::new(self.dropout).init(),
            pad_id:           self.pad_id,
            decoder_start_id: self.decoder_start_id,
            eos_id:           self.eos_id,
            max_source_len:   self.max_source_len,
            max_target_len:   self.max_target_len,
        }
    }

    /// Check that sequences of the given lengths fit the position tables.
    pub fn check_lengths(&self, source_len: usize, target_len: usize, generate_max: usize) -> Result<()> {
        ensure!(
            source_len <= self.max_source_len,
            "Input length {source_len} exceeds the model's max_source_len {}",
            self.max_source_len
        );
        ensure!(
            target_len.max(generate_max) <= self.max_target_len,
            "Target length {} exceeds the model's max_target_len {}",
            target_len.max(generate_max),
            self.max_target_len
        );
        Ok(())
    }

    fn attention<B: Backend>(&self, device: &B::Device) -> MultiHeadAttention<B> {
        MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device)
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn:   self.attention(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }

    fn build_decoder_block<B: Backend>(&self, device: &B::Device) -> DecoderBlock<B> {
        DecoderBlock {
            self_attn:   self.attention(device),
            cross_attn:  self.attention(device),
            ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:       LayerNormConfig::new(self.d_model).init(device),
            norm2:       LayerNormConfig::new(self.d_model).init(device),
            norm3:       LayerNormConfig::new(self.d_model).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// pad_mask: [batch, src_len], true where the key is padding
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub cross_attn:  MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub norm3:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> DecoderBlock<B> {
    pub fn forward(
        &self,
        x:           Tensor<B, 3>,
        memory:      Tensor<B, 3>,
        causal_mask: Tensor<B, 3, Bool>,
        memory_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_attn(causal_mask))
            .context;
        let x = self.norm1.forward(x + self.dropout.forward(attn));

        let cross = self
            .cross_attn
            .forward(MhaInput::new(x.clone(), memory.clone(), memory).mask_pad(memory_mask))
            .context;
        let x = self.norm2.forward(x + self.dropout.forward(cross));

        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm3.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Encoder–decoder transformer with a shared token embedding and
/// a language-model head over the tokenizer vocabulary.
#[derive(Module, Debug)]
pub struct KeywordTransformer<B: Backend> {
    pub token_embedding:   Embedding<B>,
    pub encoder_positions: Embedding<B>,
    pub decoder_positions: Embedding<B>,
    pub encoder:           Vec<EncoderBlock<B>>,
    pub decoder:           Vec<DecoderBlock<B>>,
    pub encoder_norm:      LayerNorm<B>,
    pub decoder_norm:      LayerNorm<B>,
    pub lm_head:           Linear<B>,
    pub dropout:           Dropout,
    pub pad_id:            usize,
    pub decoder_start_id:  usize,
    pub eos_id:            usize,
    pub max_source_len:    usize,
    pub max_target_len:    usize,
}

impl<B: Backend> KeywordTransformer<B> {
    fn embed(&self, ids: Tensor<B, 2, Int>, positions: &Embedding<B>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();
        let tok_emb = self.token_embedding.forward(ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let position_ids = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        self.dropout.forward(tok_emb + positions.forward(position_ids))
    }

    /// input_ids: [batch, src_len] → memory [batch, src_len, d_model]
    /// plus the padding mask reused by cross-attention
    pub fn encode(&self, input_ids: Tensor<B, 2, Int>) -> (Tensor<B, 3>, Tensor<B, 2, Bool>) {
        let pad_mask = input_ids.clone().equal_elem(self.pad_id as i64);
        let mut x = self.embed(input_ids, &self.encoder_positions);
        for layer in &self.encoder {
            x = layer.forward(x, pad_mask.clone());
        }
        (self.encoder_norm.forward(x), pad_mask)
    }

    /// decoder_ids: [batch, tgt_len] → logits [batch, tgt_len, vocab]
    pub fn decode(
        &self,
        decoder_ids: Tensor<B, 2, Int>,
        memory:      Tensor<B, 3>,
        memory_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = decoder_ids.dims();
        let causal_mask = generate_autoregressive_mask::<B>(batch_size, seq_len, &memory.device());

        let mut x = self.embed(decoder_ids, &self.decoder_positions);
        for layer in &self.decoder {
            x = layer.forward(x, memory.clone(), causal_mask.clone(), memory_mask.clone());
        }
        self.lm_head.forward(self.decoder_norm.forward(x))
    }
}

impl<B: Backend> Seq2SeqModel<B> for KeywordTransformer<B> {
    fn forward_loss(&self, inputs: Tensor<B, 2, Int>, labels: Tensor<B, 2, Int>) -> Seq2SeqOutput<B> {
        let [batch_size, target_len] = labels.dims();

        let (memory, memory_mask) = self.encode(inputs);
        let decoder_ids = shift_right(labels.clone(), self.decoder_start_id);
        let logits = self.decode(decoder_ids, memory, memory_mask);
        let [_, _, vocab] = logits.dims();

        // Every label position counts, padding included
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let loss = ce.forward(
            logits.clone().reshape([batch_size * target_len, vocab]),
            labels.reshape([batch_size * target_len]),
        );

        Seq2SeqOutput { loss, logits }
    }

    fn generate(&self, inputs: Tensor<B, 2, Int>, options: &GenerationOptions) -> Result<Vec<Vec<u32>>> {
        ensure!(options.max_length >= 1, "max_length must be at least 1");
        ensure!(
            options.min_length <= options.max_length,
            "min_length ({}) exceeds max_length ({})",
            options.min_length,
            options.max_length
        );
        ensure!(
            options.max_length <= self.max_target_len,
            "max_length ({}) exceeds the model's max_target_len ({})",
            options.max_length,
            self.max_target_len
        );

        let [batch_size, _] = inputs.dims();
        let device = inputs.device();
        let (memory, memory_mask) = self.encode(inputs);

        let mut sequences = vec![vec![self.decoder_start_id as u32]; batch_size];
        let mut finished  = vec![false; batch_size];
        let mut cur_len   = 1;

        while cur_len < options.max_length && !finished.iter().all(|&f| f) {
            let flat: Vec<i32> = sequences.iter().flatten().map(|&id| id as i32).collect();
            let decoder_ids = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &device)
                .reshape([batch_size, cur_len]);

            let logits = self.decode(decoder_ids, memory.clone(), memory_mask.clone());
            let [_, _, vocab] = logits.dims();
            let last: Vec<f32> = logits
                .slice([0..batch_size, cur_len - 1..cur_len, 0..vocab])
                .reshape([batch_size, vocab])
                .into_data()
                .convert::<f32>()
                .to_vec()
                .map_err(|e| anyhow::anyhow!("Cannot read logits: {e:?}"))?;

            // End-of-sequence may not be chosen while the output is too short
            let banned = (cur_len < options.min_length).then_some(self.eos_id);

            for (row, seq) in sequences.iter_mut().enumerate() {
                let next = if finished[row] {
                    self.pad_id
                } else {
                    argmax_excluding(&last[row * vocab..(row + 1) * vocab], banned)
                };
                if next == self.eos_id {
                    finished[row] = true;
                }
                seq.push(next as u32);
            }
            cur_len += 1;
        }

        Ok(sequences)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tiny_model_config;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn inputs(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 2, Int>::from_ints([[1, 1, 0, 5, 6, 2], [0, 7, 8, 9, 10, 2]], device)
    }

    #[test]
    fn test_forward_loss_shapes() {
        let device = Default::default();
        let model = tiny_model_config(40).init::<TestBackend>(&device);
        let labels = Tensor::<TestBackend, 2, Int>::from_ints([[1, 0, 5, 2], [0, 7, 8, 2]], &device);

        let out = model.forward_loss(inputs(&device), labels);
        assert_eq!(out.logits.dims(), [2, 4, 40]);

        let loss: f32 = out.loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
    }

    #[test]
    fn test_generation_respects_length_limits() {
        let device = Default::default();
        let config = tiny_model_config(40).with_dropout(0.0);
        let model = config.init::<TestBackend>(&device);

        let options = GenerationOptions { min_length: 20, max_length: 100 };
        let out = model.generate(inputs(&device), &options).unwrap();

        assert_eq!(out.len(), 2);
        for seq in &out {
            assert!(seq.len() >= 20 && seq.len() <= 100, "length {}", seq.len());
            assert_eq!(seq[0], config.decoder_start_id as u32);
            // no end-of-sequence before the minimum length
            let eos = config.eos_id as u32;
            assert!(!seq[..20].contains(&eos));
        }
    }

    #[test]
    fn test_generation_rejects_bad_limits() {
        let device = Default::default();
        let model = tiny_model_config(40).init::<TestBackend>(&device);

        let too_long = GenerationOptions { min_length: 1, max_length: 500 };
        assert!(model.generate(inputs(&device), &too_long).is_err());

        let inverted = GenerationOptions { min_length: 10, max_length: 5 };
        assert!(model.generate(inputs(&device), &inverted).is_err());
    }

    #[test]
    fn test_check_lengths() {
        let config = tiny_model_config(40);
        assert!(config.check_lengths(16, 8, 100).is_ok());
        assert!(config.check_lengths(17, 8, 100).is_err());
        assert!(config.check_lengths(16, 8, 101).is_err());
    }
}
