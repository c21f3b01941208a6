//! Prompt assembly for the answer generator.

use crate::llm::ChatMessage;

const SYSTEM_PROMPT: &str = "你是电力交易领域的智能问答助手，负责回答用户关于电力交易政策、\
电力市场动态的问题。回答要求：\n\
1. 内容准确，不要编造事实；\n\
2. 采用分点结构，逐条阐述；\n\
3. 不要在回答中声明参考资料不足或缺失，直接给出最有依据的回答。";

/// Build the chat messages for one invocation: a fixed system instruction
/// plus a user message embedding the question and a 1-indexed enumeration of
/// the reference texts in input order.
pub fn build_messages(question: &str, references: &[String]) -> Vec<ChatMessage> {
    let user = if references.is_empty() {
        format!(
            "问题：{}\n\n当前没有检索到相关的参考资料，请基于你掌握的电力交易领域知识回答。",
            question
        )
    } else {
        format!(
            "参考资料：\n{}\n\n问题：{}",
            render_references(references),
            question
        )
    };

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

fn render_references(references: &[String]) -> String {
    references
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n")
}
