#![no_main]

use libfuzzer_sys::fuzz_target;
use rsdir::KeyMapper;

// 解析成功的字符串再次格式化后必须与输入一致
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mapper = KeyMapper::new();
    if let Ok(key) = mapper.key_mapping(text) {
        let mapped = mapper.string_mapping(&key);
        // 数字字段可能带前导零，比较解析后的 key
        assert_eq!(mapper.key_mapping(&mapped).expect("re-parse"), key);
    }
});
