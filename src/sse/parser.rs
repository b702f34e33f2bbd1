/// 增量的 SSE 帧解析器
///
/// 传输层给的是任意切分的字节块，这里按行重组：`data:` 行累积，
/// 空行结束一帧，`:` 开头是注释。多行 data 按规范以 `\n` 连接。
/// `event:`/`id:`/`retry:` 字段对本协议无意义，读过即弃。
#[derive(Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 喂一块字节，返回其中完整帧的 data 载荷
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw_line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw_line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // 帧结束
                if !self.data_lines.is_empty() {
                    payloads.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            if let Some(value) = line.strip_prefix("data:") {
                self.data_lines.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }

        payloads
    }
}
